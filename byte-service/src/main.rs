//! Byte Service command-line entry point.

use anyhow::anyhow;
use clap::Parser;

use byte_service::{options::CliOptions, start_service};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Populate the environment from .env before clap reads it
    dotenv::dotenv().ok();

    // Parse command-line arguments
    let cli_opts = CliOptions::parse();

    // Convert to service options
    let service_opts = cli_opts
        .into_service_options()
        .map_err(|e| anyhow!("Failed to parse options: {}", e))?;

    // Start the service
    start_service(service_opts).await?;

    Ok(())
}
