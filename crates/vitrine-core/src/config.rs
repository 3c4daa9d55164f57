//! Configuration module
//!
//! Configuration is read once at process start from environment variables
//! (optionally seeded from a `.env` file) and handed to the composition root.
//! Nothing downstream reads the environment directly.

use std::env;

use crate::storage_types::StorageBackend;

// Common constants
const SERVER_PORT: u16 = 4000;
const SIGNED_URL_TTL_SECS: u64 = 3600;
const S3_UPLOAD_URL_TTL_SECS: u64 = 300;
const STORAGE_TIMEOUT_SECS: u64 = 5;
const STORAGE_BATCH_CONCURRENCY: usize = 8;
const MAX_UPLOAD_SIZE_MB: usize = 50;
const HTTP_CONCURRENCY_LIMIT: usize = 10_000;
const DEFAULT_ALLOWED_CONTENT_TYPES: &str =
    "image/jpeg,image/png,image/gif,image/webp,image/avif,video/mp4,video/quicktime,video/webm";

/// Server-level configuration
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub http_concurrency_limit: usize,
}

impl Default for BaseConfig {
    fn default() -> Self {
        Self {
            server_port: SERVER_PORT,
            cors_origins: vec!["*".to_string()],
            environment: "development".to_string(),
            http_concurrency_limit: HTTP_CONCURRENCY_LIMIT,
        }
    }
}

/// Storage gateway configuration
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub base: BaseConfig,
    // Backend selector
    pub storage_backend: Option<StorageBackend>,
    // Local filesystem backend
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub local_ingest_url: Option<String>,
    // Managed cloud object storage
    pub managed_cloud_url: Option<String>,
    pub managed_cloud_service_key: Option<String>,
    pub managed_cloud_bucket: Option<String>,
    pub managed_cloud_public_bucket: bool,
    // S3-compatible storage fronted by a CDN
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub s3_access_key_id: Option<String>,
    pub s3_secret_access_key: Option<String>,
    pub cdn_hostname: Option<String>,
    pub s3_upload_url_ttl_secs: u64,
    // Gateway behaviour
    pub signed_url_ttl_secs: u64,
    pub storage_timeout_secs: u64,
    pub storage_batch_concurrency: usize,
    // Upload limits
    pub max_upload_size_bytes: usize,
    pub allowed_content_types: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base: BaseConfig::default(),
            storage_backend: None,
            local_storage_path: None,
            local_storage_base_url: None,
            local_ingest_url: None,
            managed_cloud_url: None,
            managed_cloud_service_key: None,
            managed_cloud_bucket: None,
            managed_cloud_public_bucket: false,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            s3_access_key_id: None,
            s3_secret_access_key: None,
            cdn_hostname: None,
            s3_upload_url_ttl_secs: S3_UPLOAD_URL_TTL_SECS,
            signed_url_ttl_secs: SIGNED_URL_TTL_SECS,
            storage_timeout_secs: STORAGE_TIMEOUT_SECS,
            storage_batch_concurrency: STORAGE_BATCH_CONCURRENCY,
            max_upload_size_bytes: MAX_UPLOAD_SIZE_MB * 1024 * 1024,
            allowed_content_types: split_list(DEFAULT_ALLOWED_CONTENT_TYPES),
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<GatewayConfig>);

impl From<GatewayConfig> for Config {
    fn from(config: GatewayConfig) -> Self {
        Config(Box::new(config))
    }
}

impl Config {
    fn as_gateway(&self) -> &GatewayConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.as_gateway().base.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = GatewayConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_gateway().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.as_gateway().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_gateway().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.as_gateway().base.environment
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.as_gateway().base.http_concurrency_limit
    }

    pub fn storage_backend(&self) -> Option<StorageBackend> {
        self.as_gateway().storage_backend
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.as_gateway().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.as_gateway().local_storage_base_url.as_deref()
    }

    pub fn local_ingest_url(&self) -> Option<&str> {
        self.as_gateway().local_ingest_url.as_deref()
    }

    pub fn managed_cloud_url(&self) -> Option<&str> {
        self.as_gateway().managed_cloud_url.as_deref()
    }

    pub fn managed_cloud_service_key(&self) -> Option<&str> {
        self.as_gateway().managed_cloud_service_key.as_deref()
    }

    pub fn managed_cloud_bucket(&self) -> Option<&str> {
        self.as_gateway().managed_cloud_bucket.as_deref()
    }

    pub fn managed_cloud_public_bucket(&self) -> bool {
        self.as_gateway().managed_cloud_public_bucket
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.as_gateway().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.as_gateway().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.as_gateway().s3_endpoint.as_deref()
    }

    pub fn s3_access_key_id(&self) -> Option<&str> {
        self.as_gateway().s3_access_key_id.as_deref()
    }

    pub fn s3_secret_access_key(&self) -> Option<&str> {
        self.as_gateway().s3_secret_access_key.as_deref()
    }

    pub fn cdn_hostname(&self) -> Option<&str> {
        self.as_gateway().cdn_hostname.as_deref()
    }

    pub fn s3_upload_url_ttl_secs(&self) -> u64 {
        self.as_gateway().s3_upload_url_ttl_secs
    }

    pub fn signed_url_ttl_secs(&self) -> u64 {
        self.as_gateway().signed_url_ttl_secs
    }

    pub fn storage_timeout_secs(&self) -> u64 {
        self.as_gateway().storage_timeout_secs
    }

    pub fn storage_batch_concurrency(&self) -> usize {
        self.as_gateway().storage_batch_concurrency
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.as_gateway().max_upload_size_bytes
    }

    pub fn allowed_content_types(&self) -> &[String] {
        &self.as_gateway().allowed_content_types
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// `from_env` is a thin wrapper over this; tests feed a map instead of
    /// mutating the process environment.
    pub fn from_vars<F>(var: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins_str = var("CORS_ORIGINS").unwrap_or_else(|| "*".to_string());
        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let server_port: u16 = match var("PORT") {
            Some(port) => port
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            None => SERVER_PORT,
        };

        let base = BaseConfig {
            server_port,
            cors_origins,
            environment,
            http_concurrency_limit: var("HTTP_CONCURRENCY_LIMIT")
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(HTTP_CONCURRENCY_LIMIT)
                .max(1),
        };

        // An unknown selector is a configuration error, not a silent default.
        let storage_backend = match non_empty(var("STORAGE_BACKEND")) {
            Some(raw) => Some(raw.parse::<StorageBackend>()?),
            None => None,
        };

        let max_upload_size_mb = var("MAX_UPLOAD_SIZE_MB")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(MAX_UPLOAD_SIZE_MB);

        let config = GatewayConfig {
            base,
            storage_backend,
            local_storage_path: non_empty(var("LOCAL_STORAGE_PATH")),
            local_storage_base_url: non_empty(var("LOCAL_STORAGE_BASE_URL"))
                .or_else(|| Some(format!("http://localhost:{}/media", server_port))),
            local_ingest_url: non_empty(var("LOCAL_INGEST_URL")).or_else(|| {
                Some(format!(
                    "http://localhost:{}/api/v0/uploads/local",
                    server_port
                ))
            }),
            managed_cloud_url: non_empty(var("MANAGED_CLOUD_URL")),
            managed_cloud_service_key: non_empty(var("MANAGED_CLOUD_SERVICE_KEY")),
            managed_cloud_bucket: non_empty(var("MANAGED_CLOUD_BUCKET")),
            managed_cloud_public_bucket: var("MANAGED_CLOUD_PUBLIC_BUCKET")
                .unwrap_or_else(|| "false".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(false),
            s3_bucket: non_empty(var("S3_BUCKET")),
            s3_region: non_empty(var("S3_REGION")).or_else(|| non_empty(var("AWS_REGION"))),
            s3_endpoint: non_empty(var("S3_ENDPOINT")),
            s3_access_key_id: non_empty(var("S3_ACCESS_KEY_ID"))
                .or_else(|| non_empty(var("AWS_ACCESS_KEY_ID"))),
            s3_secret_access_key: non_empty(var("S3_SECRET_ACCESS_KEY"))
                .or_else(|| non_empty(var("AWS_SECRET_ACCESS_KEY"))),
            cdn_hostname: non_empty(var("CDN_HOSTNAME")),
            s3_upload_url_ttl_secs: var("S3_UPLOAD_URL_TTL_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(S3_UPLOAD_URL_TTL_SECS),
            signed_url_ttl_secs: var("SIGNED_URL_TTL_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(SIGNED_URL_TTL_SECS),
            storage_timeout_secs: var("STORAGE_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(STORAGE_TIMEOUT_SECS),
            storage_batch_concurrency: var("STORAGE_BATCH_CONCURRENCY")
                .and_then(|s| s.parse().ok())
                .unwrap_or(STORAGE_BATCH_CONCURRENCY),
            max_upload_size_bytes: max_upload_size_mb * 1024 * 1024,
            allowed_content_types: var("ALLOWED_CONTENT_TYPES")
                .map(|s| split_list(&s))
                .unwrap_or_else(|| split_list(DEFAULT_ALLOWED_CONTENT_TYPES)),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        let environment = self.base.environment.to_lowercase();
        let is_production = environment == "production" || environment == "prod";
        if is_production && self.base.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if self.signed_url_ttl_secs == 0 {
            return Err(anyhow::anyhow!("SIGNED_URL_TTL_SECS must be greater than 0"));
        }
        if self.storage_timeout_secs == 0 {
            return Err(anyhow::anyhow!("STORAGE_TIMEOUT_SECS must be greater than 0"));
        }
        if self.storage_batch_concurrency == 0 {
            return Err(anyhow::anyhow!(
                "STORAGE_BATCH_CONCURRENCY must be greater than 0"
            ));
        }

        let backend = self.storage_backend.ok_or_else(|| {
            anyhow::anyhow!("STORAGE_BACKEND must be set to one of: local, managed-cloud, s3-cdn")
        })?;

        match backend {
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
                if self.local_ingest_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_INGEST_URL must be set when using local storage backend"
                    ));
                }
            }
            StorageBackend::ManagedCloud => {
                if self.managed_cloud_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "MANAGED_CLOUD_URL must be set when using managed-cloud storage backend"
                    ));
                }
                if self.managed_cloud_service_key.is_none() {
                    return Err(anyhow::anyhow!(
                        "MANAGED_CLOUD_SERVICE_KEY must be set when using managed-cloud storage backend"
                    ));
                }
                if self.managed_cloud_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "MANAGED_CLOUD_BUCKET must be set when using managed-cloud storage backend"
                    ));
                }
            }
            StorageBackend::S3Cdn => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using s3-cdn storage backend"
                    ));
                }
                if self.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using s3-cdn storage backend"
                    ));
                }
                if let Some(host) = &self.cdn_hostname {
                    let bare = host
                        .trim_start_matches("https://")
                        .trim_start_matches("http://")
                        .trim_end_matches('/');
                    if bare.is_empty() || bare.contains('/') {
                        return Err(anyhow::anyhow!(
                            "CDN_HOSTNAME must be a bare hostname (got {})",
                            host
                        ));
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(pairs: &[(&str, &str)]) -> Result<GatewayConfig, anyhow::Error> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        GatewayConfig::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_missing_backend_is_rejected() {
        let err = from_map(&[]).unwrap_err();
        assert!(err.to_string().contains("STORAGE_BACKEND"));
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        let err = from_map(&[("STORAGE_BACKEND", "ftp")]).unwrap_err();
        assert!(err.to_string().contains("Invalid storage backend"));
    }

    #[test]
    fn test_local_defaults() {
        let config = from_map(&[
            ("STORAGE_BACKEND", "local"),
            ("LOCAL_STORAGE_PATH", "/tmp/vitrine"),
            ("PORT", "8080"),
        ])
        .unwrap();

        assert_eq!(config.storage_backend, Some(StorageBackend::Local));
        assert_eq!(
            config.local_storage_base_url.as_deref(),
            Some("http://localhost:8080/media")
        );
        assert_eq!(
            config.local_ingest_url.as_deref(),
            Some("http://localhost:8080/api/v0/uploads/local")
        );
        assert_eq!(config.signed_url_ttl_secs, 3600);
        assert!(config
            .allowed_content_types
            .contains(&"image/jpeg".to_string()));
    }

    #[test]
    fn test_local_requires_path() {
        let err = from_map(&[("STORAGE_BACKEND", "local")]).unwrap_err();
        assert!(err.to_string().contains("LOCAL_STORAGE_PATH"));
    }

    #[test]
    fn test_s3_cdn_region_falls_back_to_aws_region() {
        let config = from_map(&[
            ("STORAGE_BACKEND", "s3-cdn"),
            ("S3_BUCKET", "ic-catalogue"),
            ("AWS_REGION", "eu-west-1"),
            ("CDN_HOSTNAME", "cdn.example.com"),
        ])
        .unwrap();

        assert_eq!(config.s3_region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.cdn_hostname.as_deref(), Some("cdn.example.com"));
    }

    #[test]
    fn test_cdn_hostname_must_not_carry_a_path() {
        let err = from_map(&[
            ("STORAGE_BACKEND", "s3-cdn"),
            ("S3_BUCKET", "ic-catalogue"),
            ("S3_REGION", "eu-west-1"),
            ("CDN_HOSTNAME", "cdn.example.com/ic-catalogue"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("CDN_HOSTNAME"));
    }

    #[test]
    fn test_managed_cloud_requires_credentials() {
        let err = from_map(&[
            ("STORAGE_BACKEND", "managed-cloud"),
            ("MANAGED_CLOUD_URL", "https://project.example.co"),
            ("MANAGED_CLOUD_BUCKET", "catalogue"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("MANAGED_CLOUD_SERVICE_KEY"));
    }

    #[test]
    fn test_wildcard_cors_rejected_in_production() {
        let err = from_map(&[
            ("ENVIRONMENT", "production"),
            ("STORAGE_BACKEND", "local"),
            ("LOCAL_STORAGE_PATH", "/tmp/vitrine"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("CORS_ORIGINS"));
    }
}
