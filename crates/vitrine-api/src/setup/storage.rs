//! Storage setup and initialization

use anyhow::{Context, Result};
use vitrine_core::Config;
use vitrine_services::{create_storage, ConfiguredStorage};

/// Build the configured backend. Failure here aborts startup.
pub async fn setup_storage(config: &Config) -> Result<ConfiguredStorage> {
    tracing::info!("Initializing storage backend...");
    let configured = create_storage(config)
        .await
        .context("Failed to initialize storage backend")?;

    tracing::info!(
        backend = %configured.backend_type(),
        local_ingest = configured.local.is_some(),
        "Storage backend ready"
    );

    Ok(configured)
}
