//! # Content Backend
//!
//! Entry point that initializes:
//! - Tracing/logging subsystem
//! - Configuration loading
//! - Database connection pool and migrations
//! - Service wiring

use anyhow::Result;
use tracing::info;

use content_backend::config::Settings;
use content_backend::startup::Backend;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for structured logging
    content_backend::telemetry::init_tracing();

    info!("Starting Content Backend...");

    // Load configuration from environment and config files
    let settings = Settings::load()?;
    info!(
        environment = %settings.environment,
        max_page_limit = settings.pagination.max_page_limit,
        dedupe_by_name = ?settings.references.dedupe_by_name,
        "Configuration loaded"
    );

    let backend = Backend::build(settings).await?;
    info!("Backend ready");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");
    backend.shutdown().await;

    Ok(())
}
