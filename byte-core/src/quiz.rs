//! Quiz request and question types.
//!
//! A quiz goes through three shapes:
//! - QuizRequest: what the caller asked for, exactly as received
//! - QuizPlan: the validated and normalized request
//! - Question: one multiple-choice record parsed from the model output

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{QuizError, Result};

/// Model used when the request does not name one.
pub const DEFAULT_MODEL: &str = "gpt-oss:20b";

/// Smallest number of questions a request may ask for.
pub const MIN_QUESTIONS: i64 = 1;

/// Largest number of questions a request may ask for.
pub const MAX_QUESTIONS: i64 = 50;

/// Request for a generated quiz, as received from the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizRequest {
    /// Programming language the questions are about
    #[serde(rename = "lang", default = "default_language")]
    pub language: String,

    /// Number of questions to generate
    #[serde(default = "default_num_questions")]
    pub num_questions: i64,

    /// Difficulty level: easy, medium or hard
    #[serde(default = "default_difficulty")]
    pub difficulty: String,

    /// Upstream model id (defaults to the generator's configured model)
    #[serde(default)]
    pub model: Option<String>,

    /// Whether to stream the model output
    #[serde(default)]
    pub stream: bool,
}

fn default_language() -> String {
    "python".to_string()
}

fn default_num_questions() -> i64 {
    5
}

fn default_difficulty() -> String {
    "medium".to_string()
}

impl Default for QuizRequest {
    fn default() -> Self {
        Self {
            language: default_language(),
            num_questions: default_num_questions(),
            difficulty: default_difficulty(),
            model: None,
            stream: false,
        }
    }
}

impl QuizRequest {
    /// Validate and normalize the request.
    ///
    /// Difficulty is checked first, then language, then the question count.
    /// `default_model` fills in the model when the request leaves it out.
    pub fn validate(&self, default_model: &str) -> Result<QuizPlan> {
        let difficulty = self.difficulty.parse::<Difficulty>()?;

        let language = self.language.trim();
        if language.is_empty() {
            return Err(QuizError::EmptyLanguage);
        }

        if !(MIN_QUESTIONS..=MAX_QUESTIONS).contains(&self.num_questions) {
            return Err(QuizError::QuestionCountOutOfRange(self.num_questions));
        }

        let model = self
            .model
            .clone()
            .unwrap_or_else(|| default_model.to_string());

        Ok(QuizPlan {
            language: language.to_string(),
            num_questions: self.num_questions as u32,
            difficulty,
            model,
            stream: self.stream,
        })
    }
}

/// Quiz difficulty level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = QuizError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(QuizError::InvalidDifficulty(s.to_string())),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated quiz request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizPlan {
    pub language: String,
    pub num_questions: u32,
    pub difficulty: Difficulty,
    pub model: String,
    pub stream: bool,
}

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// The question text
    pub question: String,

    /// Candidate answers, in the order the model produced them
    #[serde(default)]
    pub options: Vec<String>,

    /// The correct answer, one of `options`
    pub answer: String,
}

impl Question {
    /// Check the rules serde cannot express: a non-empty question and an
    /// answer that is one of the options.
    pub fn check(&self) -> std::result::Result<(), String> {
        if self.question.trim().is_empty() {
            return Err("question text is empty".to_string());
        }
        if !self.options.iter().any(|option| option == &self.answer) {
            return Err(format!(
                "answer {:?} is not one of the options for {:?}",
                self.answer, self.question
            ));
        }
        Ok(())
    }
}
