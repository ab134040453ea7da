//! Core types and functionality for the Byte quiz server.
//!
//! This crate holds everything that decides what a quiz request means and what
//! comes back from it: request validation, prompt construction, the chat model
//! abstraction, and the parse-with-repair routine that turns model output into
//! question records.

mod error;
mod quiz;
pub mod chat;
pub mod generator;
pub mod parse;
pub mod prompt;

// Re-export core types
pub use chat::{ChatCompletion, ChatError, ChatMessage, ChatModel, ChatResponse, ChatRole, TextStream};
pub use error::{QuizError, Result};
pub use generator::{QuizGenerator, QuizOutput, QuizTextStream};
pub use quiz::{Difficulty, Question, QuizRequest, QuizPlan, DEFAULT_MODEL, MAX_QUESTIONS, MIN_QUESTIONS};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
