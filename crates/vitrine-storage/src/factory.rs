#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-managed-cloud")]
use crate::ManagedCloudStorage;
#[cfg(feature = "storage-s3")]
use crate::{S3CdnSettings, S3CdnStorage};
use crate::{Storage, StorageBackend, StorageError, StorageResult, TimeoutStorage};
use std::sync::Arc;
use std::time::Duration;
use vitrine_core::Config;

/// The active backend, built once at startup.
#[derive(Clone)]
pub struct ConfiguredStorage {
    /// Backend wrapped in the per-call timeout; used for every gateway operation.
    pub storage: Arc<dyn Storage>,
    /// Concrete local backend, present only when it is the active one. The
    /// ingestion route writes through it.
    #[cfg(feature = "storage-local")]
    pub local: Option<Arc<LocalStorage>>,
}

impl ConfiguredStorage {
    pub fn backend_type(&self) -> StorageBackend {
        self.storage.backend_type()
    }
}

fn required<'a>(value: Option<&'a str>, name: &str) -> StorageResult<&'a str> {
    value.ok_or_else(|| StorageError::Config(format!("{} not configured", name)))
}

/// Create the storage backend selected by configuration
///
/// A missing selector or an unavailable backend is a fatal configuration
/// error; nothing falls back to a default backend.
pub async fn create_storage(config: &Config) -> StorageResult<ConfiguredStorage> {
    let backend = config.storage_backend().ok_or_else(|| {
        StorageError::Config(
            "STORAGE_BACKEND must be set to one of: local, managed-cloud, s3-cdn".to_string(),
        )
    })?;
    let timeout = Duration::from_secs(config.storage_timeout_secs());

    #[cfg(feature = "storage-local")]
    let mut local: Option<Arc<LocalStorage>> = None;

    let inner: Arc<dyn Storage> = match backend {
        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = required(config.local_storage_path(), "LOCAL_STORAGE_PATH")?;
            let base_url = required(config.local_storage_base_url(), "LOCAL_STORAGE_BASE_URL")?;
            let ingest_url = required(config.local_ingest_url(), "LOCAL_INGEST_URL")?;

            let storage = Arc::new(
                LocalStorage::new(base_path, base_url.to_string(), ingest_url.to_string()).await?,
            );
            local = Some(storage.clone());
            storage
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => {
            return Err(StorageError::Config(
                "Local storage backend not available (storage-local feature not enabled)"
                    .to_string(),
            ))
        }

        #[cfg(feature = "storage-managed-cloud")]
        StorageBackend::ManagedCloud => {
            let url = required(config.managed_cloud_url(), "MANAGED_CLOUD_URL")?;
            let service_key =
                required(config.managed_cloud_service_key(), "MANAGED_CLOUD_SERVICE_KEY")?;
            let bucket = required(config.managed_cloud_bucket(), "MANAGED_CLOUD_BUCKET")?;

            Arc::new(ManagedCloudStorage::new(
                url.to_string(),
                service_key.to_string(),
                bucket.to_string(),
                config.managed_cloud_public_bucket(),
            )?)
        }

        #[cfg(not(feature = "storage-managed-cloud"))]
        StorageBackend::ManagedCloud => {
            return Err(StorageError::Config(
                "Managed cloud storage backend not available (storage-managed-cloud feature not enabled)"
                    .to_string(),
            ))
        }

        #[cfg(feature = "storage-s3")]
        StorageBackend::S3Cdn => {
            let bucket = required(config.s3_bucket(), "S3_BUCKET")?;
            let region = required(config.s3_region(), "S3_REGION or AWS_REGION")?;

            Arc::new(S3CdnStorage::new(S3CdnSettings {
                bucket: bucket.to_string(),
                region: region.to_string(),
                endpoint: config.s3_endpoint().map(String::from),
                access_key_id: config.s3_access_key_id().map(String::from),
                secret_access_key: config.s3_secret_access_key().map(String::from),
                cdn_hostname: config.cdn_hostname().map(String::from),
                upload_url_ttl: Duration::from_secs(config.s3_upload_url_ttl_secs()),
            })?)
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3Cdn => {
            return Err(StorageError::Config(
                "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
            ))
        }
    };

    tracing::info!(
        backend = %backend,
        timeout_secs = timeout.as_secs(),
        "Storage backend initialized"
    );

    Ok(ConfiguredStorage {
        storage: Arc::new(TimeoutStorage::new(inner, timeout)),
        #[cfg(feature = "storage-local")]
        local,
    })
}
