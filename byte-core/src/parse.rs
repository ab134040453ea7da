//! Turning model output into question records.
//!
//! Models are asked for a bare JSON array but often wrap it in prose. Parsing
//! therefore happens in two attempts: the whole text, then the first
//! bracketed span. Whatever survives is checked against the question shape
//! as a whole; a single bad element rejects the batch.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::{QuizError, Result};
use crate::quiz::Question;

// First '[' through the last ']', across newlines.
static BRACKETED_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*\]").expect("bracketed span pattern is valid"));

/// Parse model output as JSON, falling back to the first bracketed span.
///
/// Returns `None` when neither attempt yields a JSON value. A literal `null`
/// counts as a failed parse.
pub fn parse_with_repair(content: &str) -> Option<Value> {
    let parsed = match serde_json::from_str::<Value>(content) {
        Ok(value) => Some(value),
        Err(_) => BRACKETED_SPAN
            .find(content)
            .and_then(|span| serde_json::from_str::<Value>(span.as_str()).ok()),
    };

    parsed.filter(|value| !value.is_null())
}

/// Validate a parsed value as an ordered list of questions.
pub fn questions_from_value(value: Value) -> Result<Vec<Question>> {
    let questions: Vec<Question> =
        serde_json::from_value(value).map_err(|e| QuizError::SchemaMismatch(e.to_string()))?;

    for question in &questions {
        question.check().map_err(QuizError::SchemaMismatch)?;
    }

    Ok(questions)
}
