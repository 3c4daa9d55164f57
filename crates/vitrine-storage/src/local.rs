use crate::keys::{canonical_url, contains_key_root, StorageKey};
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use vitrine_core::models::UploadTarget;

/// Local filesystem storage implementation
///
/// Uploads are two-phase: `negotiate_upload` points the caller at the
/// ingestion endpoint of this service, and the bytes are written only when
/// that endpoint calls [`LocalStorage::ingest`].
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
    ingest_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/vitrine/media")
    /// * `base_url` - Base URL the root directory is served under (e.g., "http://localhost:4000/media")
    /// * `ingest_url` - Ingestion endpoint handed to callers at negotiation time
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: String,
        ingest_url: String,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();

        if contains_key_root(&base_url) {
            return Err(StorageError::Config(format!(
                "LOCAL_STORAGE_BASE_URL must not contain a 'designs' segment: {}",
                base_url
            )));
        }

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::Config(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
            ingest_url,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Convert storage key to filesystem path with security validation
    ///
    /// `StorageKey` already rejects relative segments; this additionally
    /// refuses paths that resolve outside the root through symlinks. The
    /// target usually does not exist yet, so the nearest existing ancestor
    /// is the one resolved.
    fn key_to_path(&self, key: &StorageKey) -> StorageResult<PathBuf> {
        let path = self.base_path.join(key.as_str());

        let base_canonical = self.base_path.canonicalize().map_err(|e| {
            StorageError::Config(format!("Failed to canonicalize base path: {}", e))
        })?;

        let existing = path
            .ancestors()
            .find(|ancestor| ancestor.symlink_metadata().is_ok())
            .unwrap_or(self.base_path.as_path());

        let resolved = existing.canonicalize().map_err(|e| {
            StorageError::InvalidKey(format!(
                "Storage key path cannot be resolved ({}): {}",
                existing.display(),
                e
            ))
        })?;

        if resolved.strip_prefix(&base_canonical).is_err() {
            return Err(StorageError::InvalidKey(
                "Storage key resolves outside storage directory".to_string(),
            ));
        }

        Ok(path)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write uploaded bytes under the root, mirroring the key path.
    ///
    /// Returns the public URL of the stored file.
    pub async fn ingest(&self, key: &StorageKey, data: Bytes) -> StorageResult<String> {
        let path = self.key_to_path(key)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        let url = self.public_url(key);

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage ingest successful"
        );

        Ok(url)
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn negotiate_upload(
        &self,
        key: &StorageKey,
        _content_type: &str,
    ) -> StorageResult<UploadTarget> {
        self.key_to_path(key)?;

        Ok(UploadTarget {
            upload_url: self.ingest_url.clone(),
            public_url: self.public_url(key),
            key: key.to_string(),
            token: None,
        })
    }

    async fn delete(&self, key: &StorageKey) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        let start = std::time::Instant::now();

        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(key = %key, "Local storage delete: object already absent");
                return Ok(());
            }
            Err(e) => {
                return Err(StorageError::DeleteFailed(format!(
                    "Failed to delete file {}: {}",
                    path.display(),
                    e
                )))
            }
        }

        tracing::info!(
            path = %path.display(),
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn sign_get_url(
        &self,
        key: &StorageKey,
        canonical_url: &str,
        _expires_in: Duration,
    ) -> StorageResult<String> {
        self.key_to_path(key)?;
        Ok(canonical_url.to_string())
    }

    fn public_url(&self, key: &StorageKey) -> String {
        canonical_url(&self.base_url, key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
