//! Ollama chat client for the Byte quiz server.
//!
//! This crate provides the ChatModel implementation that talks to an Ollama
//! server (hosted or local) over its HTTP chat API, in both aggregate and
//! streaming mode.

pub mod config;
pub mod stream;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use byte_core::{ChatError, ChatMessage, ChatModel, ChatResponse, TextStream};

pub use config::{OllamaConfig, DEFAULT_OLLAMA_BASE_URL};

/// Request payload in Ollama chat format
#[derive(Debug, Serialize)]
struct ChatPayload<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

/// Client for accessing Ollama models via HTTP API.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    /// HTTP client for API requests
    client: Client,
    /// Full URL of the chat endpoint
    chat_url: String,
}

impl OllamaClient {
    /// Create a new Ollama client.
    ///
    /// A missing API key is accepted here; the server rejects the calls later
    /// if it requires one.
    pub fn new(config: OllamaConfig) -> Result<Self, ChatError> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &config.api_key {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| ChatError::Request(format!("Invalid API key: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ChatError::Request(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            chat_url: config.chat_url(),
        })
    }

    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }

    async fn send(&self, model: &str, messages: &[ChatMessage], stream: bool) -> Result<Response, ChatError> {
        let payload = ChatPayload {
            model,
            messages,
            stream,
        };

        debug!("Sending chat request to {} (model: {}, stream: {})", self.chat_url, model, stream);

        // Send the request
        let response = self
            .client
            .post(&self.chat_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ChatError::Request(format!("Failed to send request to Ollama ({}): {}", self.chat_url, e)))?;

        // Check if the request was successful
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ChatError::Status { status, body });
        }

        Ok(response)
    }
}

#[async_trait]
impl ChatModel for OllamaClient {
    async fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<ChatResponse, ChatError> {
        let response = self.send(model, messages, false).await?;

        // Parse the response
        let response_json: Value = response
            .json()
            .await
            .map_err(|e| ChatError::Decode(format!("Failed to parse Ollama response: {}", e)))?;

        Ok(ChatResponse::from_value(response_json))
    }

    async fn chat_stream(&self, model: &str, messages: &[ChatMessage]) -> Result<TextStream, ChatError> {
        let response = self.send(model, messages, true).await?;

        Ok(stream::token_stream(response.bytes_stream()))
    }
}
