//! Configuration options for the Byte Service.
//!
//! This module defines the command-line options and configuration settings
//! for the Byte Service. Every option can also be given through the
//! environment, which a `.env` file may populate.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

use byte_core::DEFAULT_MODEL;
use byte_ollama::DEFAULT_OLLAMA_BASE_URL;

use crate::{LogLevel, ServiceOptions};

/// Command-line arguments for the Byte Service.
#[derive(Parser, Debug)]
#[command(author, version, about = "Programming quiz generator backed by an Ollama chat model")]
pub struct CliOptions {
    /// Address to bind the server to
    #[arg(short, long, env = "BYTE_BIND", default_value = "127.0.0.1:8000")]
    pub bind: String,

    /// Base URL of the Ollama server
    #[arg(long, env = "OLLAMA_BASE_URL", default_value = DEFAULT_OLLAMA_BASE_URL)]
    pub ollama_base_url: String,

    /// API key sent to the Ollama server as a bearer token
    #[arg(long, env = "OLLAMA_API_KEY", hide_env_values = true)]
    pub ollama_api_key: Option<String>,

    /// Model used when a request does not name one
    #[arg(long, env = "BYTE_DEFAULT_MODEL", default_value = DEFAULT_MODEL)]
    pub default_model: String,

    /// Timeout for a single upstream call, in seconds (0 disables it)
    #[arg(long, env = "BYTE_UPSTREAM_TIMEOUT", default_value_t = 120)]
    pub upstream_timeout: u64,

    /// Enable debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub debug: bool,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl CliOptions {
    /// Convert CLI options to ServiceOptions
    pub fn into_service_options(self) -> Result<ServiceOptions, String> {
        // Parse bind address
        let bind_address = self
            .bind
            .parse::<SocketAddr>()
            .map_err(|e| format!("Invalid bind address: {}", e))?;

        if self.default_model.trim().is_empty() {
            return Err("Default model must not be empty".to_string());
        }

        let upstream_timeout = match self.upstream_timeout {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        let log_level = if self.debug {
            LogLevel::Debug
        } else if self.quiet {
            LogLevel::Quiet
        } else {
            LogLevel::Normal
        };

        Ok(ServiceOptions {
            bind_address,
            ollama_base_url: self.ollama_base_url,
            ollama_api_key: self.ollama_api_key.filter(|key| !key.trim().is_empty()),
            default_model: self.default_model,
            upstream_timeout,
            init_tracing: true,
            log_level,
        })
    }
}
