//! Application setup and initialization
//!
//! Startup order: validate configuration, initialize telemetry, build the
//! storage backend and gateway, then mount routes.

pub mod routes;
pub mod server;
pub mod storage;
pub mod validation;

use crate::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use vitrine_core::Config;
use vitrine_infra::LogFormat;
use vitrine_services::MediaGateway;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration
    validation::validate_config(&config).context("Configuration validation failed")?;

    vitrine_infra::init_telemetry(
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        LogFormat::for_environment(config.is_production()),
    )
    .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment(),
        "Configuration loaded and validated successfully"
    );

    build_app(config).await
}

/// Build state and router without touching global telemetry.
pub async fn build_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    let configured = storage::setup_storage(&config).await?;

    let gateway = MediaGateway::from_config(configured.storage, &config);
    let state = Arc::new(AppState::new(config.clone(), gateway, configured.local));

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
