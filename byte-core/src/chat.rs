//! Chat model interface for the Byte quiz server.
//!
//! The ChatModel trait is the only seam between quiz generation and the
//! upstream LLM provider. Implementations own their transport; callers only
//! see messages going in and text coming out.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised by a chat model implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// The request could not be sent or the connection failed
    #[error("request failed: {0}")]
    Request(String),

    /// The provider answered with a non-success status
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The provider's response could not be decoded
    #[error("invalid response: {0}")]
    Decode(String),

    /// The provider reported an error inside an otherwise successful response
    #[error("{0}")]
    Upstream(String),

    /// The call did not complete within the configured timeout
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Incremental text produced by a streaming chat call.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, ChatError>> + Send>>;

/// Role of a chat message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
    Tool,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Typed form of an aggregate chat response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub model: Option<String>,
    pub message: ChatMessage,
    #[serde(default)]
    pub done: bool,
}

/// An aggregate chat response in whichever shape the provider returned.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatResponse {
    /// A response that decoded into the typed completion shape
    Completion(ChatCompletion),

    /// Any other JSON object; content is looked up by key
    Mapping(Map<String, Value>),
}

impl ChatResponse {
    /// Classify a raw provider response.
    ///
    /// The typed shape is tried first. Objects that do not fit it are kept as
    /// a mapping; anything that is not an object becomes an empty mapping.
    pub fn from_value(value: Value) -> Self {
        match serde_json::from_value::<ChatCompletion>(value.clone()) {
            Ok(completion) => ChatResponse::Completion(completion),
            Err(_) => match value {
                Value::Object(map) => ChatResponse::Mapping(map),
                _ => ChatResponse::Mapping(Map::new()),
            },
        }
    }

    /// The assistant's text, if the response carries any.
    pub fn content(&self) -> Option<&str> {
        match self {
            ChatResponse::Completion(completion) => Some(completion.message.content.as_str()),
            ChatResponse::Mapping(map) => map
                .get("message")
                .and_then(|message| message.get("content"))
                .and_then(|content| content.as_str()),
        }
    }
}

/// Capability to hold a chat conversation with an upstream model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send the messages and wait for the full response.
    async fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<ChatResponse, ChatError>;

    /// Send the messages and receive the response text as it is produced.
    async fn chat_stream(&self, model: &str, messages: &[ChatMessage]) -> Result<TextStream, ChatError>;
}
