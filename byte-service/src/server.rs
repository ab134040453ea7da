//! HTTP server implementation for the Byte Service.
//!
//! This module wires the chat client and quiz generator together, installs
//! logging and runs the axum server until Ctrl-C.

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use byte_core::QuizGenerator;
use byte_ollama::{OllamaClient, OllamaConfig};

use crate::{router, AppState, LogLevel, Result, ServiceError, ServiceOptions};

/// Run the HTTP server with the provided options.
pub async fn run_server(options: ServiceOptions) -> Result<()> {
    // Initialize tracing if requested, with appropriate log level
    if options.init_tracing {
        init_tracing(options.log_level);
    }

    // Create the chat client, once for the whole process
    if options.ollama_api_key.is_none() {
        warn!("No Ollama API key configured; requests to an authenticated server will fail");
    }
    let client = OllamaClient::new(OllamaConfig::new(
        options.ollama_base_url.clone(),
        options.ollama_api_key.clone(),
    ))
    .map_err(|e| ServiceError::ServerError(format!("Failed to create Ollama client: {}", e)))?;
    info!("Using Ollama chat endpoint {}", client.chat_url());

    // Create the generator and shared state
    let generator = QuizGenerator::new(Arc::new(client))
        .with_default_model(options.default_model.clone())
        .with_timeout(options.upstream_timeout);
    let app = router(AppState::new(generator));

    // Start the server
    info!("Starting Byte server on {}", options.bind_address);
    let listener = tokio::net::TcpListener::bind(options.bind_address)
        .await
        .map_err(|e| ServiceError::ServerError(format!("Failed to bind to address: {}", e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServiceError::ServerError(format!("Server error: {}", e)))?;

    info!("Byte server stopped");
    Ok(())
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the level chosen on the command line.
pub fn init_tracing(log_level: LogLevel) {
    let default_filter = match log_level {
        LogLevel::Debug => "byte_service=debug,byte_core=debug,byte_ollama=debug,tower_http=debug",
        LogLevel::Normal => "byte_service=info,byte_core=info,byte_ollama=info,tower_http=info",
        LogLevel::Quiet => "byte_service=error,byte_core=error,byte_ollama=error,tower_http=error",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // A subscriber may already be installed when embedded in another process
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
