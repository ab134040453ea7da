//! Error types for quiz generation.

use thiserror::Error;

use crate::chat::ChatError;

/// Errors produced while turning a quiz request into questions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuizError {
    /// The requested difficulty is not one of easy, medium, hard
    #[error("difficulty must be one of: easy, medium, hard")]
    InvalidDifficulty(String),

    /// The requested language is empty after trimming
    #[error("lang must be a non-empty string")]
    EmptyLanguage,

    /// The requested question count is outside the accepted range
    #[error("num_questions must be between 1 and 50, got {0}")]
    QuestionCountOutOfRange(i64),

    /// The chat model call failed before producing any content
    #[error("Model call failed: {0}")]
    UpstreamCallFailed(String),

    /// The chat model answered without any extractable text
    #[error("Empty response from model")]
    EmptyUpstreamResponse,

    /// The model produced JSON that does not describe a list of questions
    #[error("Parsed JSON does not match expected question schema")]
    SchemaMismatch(String),
}

impl QuizError {
    /// Whether the error was caused by the caller's input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            QuizError::InvalidDifficulty(_)
                | QuizError::EmptyLanguage
                | QuizError::QuestionCountOutOfRange(_)
        )
    }

    /// Stable machine-readable code for the error.
    pub fn code(&self) -> &'static str {
        match self {
            QuizError::InvalidDifficulty(_) => "invalid_difficulty",
            QuizError::EmptyLanguage => "empty_language",
            QuizError::QuestionCountOutOfRange(_) => "question_count_out_of_range",
            QuizError::UpstreamCallFailed(_) => "upstream_call_failed",
            QuizError::EmptyUpstreamResponse => "empty_upstream_response",
            QuizError::SchemaMismatch(_) => "schema_mismatch",
        }
    }
}

impl From<ChatError> for QuizError {
    fn from(err: ChatError) -> Self {
        QuizError::UpstreamCallFailed(err.to_string())
    }
}

/// Result type alias for quiz operations
pub type Result<T> = std::result::Result<T, QuizError>;
