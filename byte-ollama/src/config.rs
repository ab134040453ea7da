use std::time::Duration;

/// Default Ollama base URL (the hosted API)
pub const DEFAULT_OLLAMA_BASE_URL: &str = "https://ollama.com";

/// Default time allowed for establishing a connection
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for an Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Base URL of the server, without the API path
    pub base_url: String,
    /// Bearer token sent with every request, if any
    pub api_key: Option<String>,
    /// Time allowed for establishing a connection
    pub connect_timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            api_key: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl OllamaConfig {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            ..Self::default()
        }
    }

    /// Get the chat endpoint URL
    pub fn chat_url(&self) -> String {
        // Remove trailing slash if present
        let base_url = self.base_url.trim_end_matches('/');

        format!("{}/api/chat", base_url)
    }
}
