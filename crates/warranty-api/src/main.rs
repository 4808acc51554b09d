//! Warranty API server entry point
//!
//! Run with:
//! ```bash
//! cargo run -p warranty-api
//! ```
//!
//! Configuration is loaded from environment variables (and `.env` when present).

use anyhow::Context;
use tracing::{error, info};
use warranty_common::{init_tracing, AppConfig, TracingConfig};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = format!("{e:#}"), "Server failed");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("Failed to load configuration")?;

    if let Err(e) = init_tracing(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        env = ?config.app.env,
        port = config.api.port,
        guild_id = %config.discord.guild_id,
        "Configuration loaded"
    );

    warranty_api::run(config).await.context("Server error")?;

    Ok(())
}
