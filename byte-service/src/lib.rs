//! Byte Service implementation.
//!
//! This crate provides the HTTP server that exposes quiz generation. It owns
//! everything around the generator: routing, request parsing, CORS, status
//! mapping, configuration and logging.

pub mod handlers;
pub mod options;
pub mod router;
pub mod server;

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use byte_core::{QuizError, QuizGenerator, DEFAULT_MODEL};
use byte_ollama::DEFAULT_OLLAMA_BASE_URL;

pub use router::router;

/// Error type for Byte Service operations
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Quiz(#[from] QuizError),

    #[error("Malformed request body: {0}")]
    MalformedRequestBody(String),

    #[error("Server error: {0}")]
    ServerError(String),
}

impl ServiceError {
    /// HTTP status reported for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Quiz(e) if e.is_client_error() => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Quiz(QuizError::UpstreamCallFailed(_)) => StatusCode::BAD_GATEWAY,
            ServiceError::Quiz(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::MalformedRequestBody(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::ServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Quiz(e) => e.code(),
            ServiceError::MalformedRequestBody(_) => "malformed_request_body",
            ServiceError::ServerError(_) => "server_error",
        }
    }
}

/// JSON body of an error response
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    detail: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed with {}: {}", status, self);
        } else {
            tracing::warn!("Request rejected with {}: {}", status, self);
        }

        let body = ErrorBody {
            error: self.code(),
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Type alias for service results
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Logging verbosity for the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Normal,
    Quiet,
}

/// Configuration options for the Byte Service.
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    /// Address to bind the server to
    pub bind_address: SocketAddr,

    /// Base URL of the Ollama server
    pub ollama_base_url: String,

    /// Bearer token for the Ollama server
    pub ollama_api_key: Option<String>,

    /// Model used when a request does not name one
    pub default_model: String,

    /// Upper bound on a single upstream call (None waits indefinitely)
    pub upstream_timeout: Option<Duration>,

    /// Whether to install the tracing subscriber
    pub init_tracing: bool,

    /// Logging verbosity
    pub log_level: LogLevel,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from((Ipv4Addr::LOCALHOST, 8000)),
            ollama_base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            ollama_api_key: None,
            default_model: DEFAULT_MODEL.to_string(),
            upstream_timeout: Some(Duration::from_secs(120)),
            init_tracing: true,
            log_level: LogLevel::Normal,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Quiz generator shared by all requests
    pub generator: Arc<QuizGenerator>,
}

impl AppState {
    pub fn new(generator: QuizGenerator) -> Self {
        Self {
            generator: Arc::new(generator),
        }
    }
}

/// Start the Byte Service with the given options.
///
/// This is the main entry point for starting the service programmatically.
pub async fn start_service(options: ServiceOptions) -> Result<()> {
    server::run_server(options).await
}
