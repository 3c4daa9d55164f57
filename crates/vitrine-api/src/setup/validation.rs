//! Configuration validation
//!
//! Checks that only matter for the HTTP process. Backend settings are
//! validated by `Config::validate`.

use anyhow::Result;
use vitrine_core::Config;

/// Validate critical configuration values
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    let is_production = config.is_production();
    let env_var = std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .ok();

    if is_production && env_var.is_none() {
        tracing::warn!(
            "Production mode detected but ENVIRONMENT/APP_ENV not set - error details may leak"
        );
    }

    if config.http_concurrency_limit() == 0 {
        return Err(anyhow::anyhow!("HTTP concurrency limit cannot be 0"));
    }

    if config.max_upload_size_bytes() == 0 {
        return Err(anyhow::anyhow!("Max upload size cannot be 0"));
    }

    if config.allowed_content_types().is_empty() {
        return Err(anyhow::anyhow!(
            "ALLOWED_CONTENT_TYPES must list at least one content type"
        ));
    }

    if config.signed_url_ttl_secs() > 7 * 24 * 3600 {
        tracing::warn!(
            signed_url_ttl_secs = config.signed_url_ttl_secs(),
            "Signed URL lifetime exceeds 7 days - S3 presigning will reject it"
        );
    }

    tracing::info!("Configuration validation passed");
    Ok(())
}
