//! Media gateway
//!
//! Front door to the active storage backend. Write-path failures (upload
//! negotiation) are returned to the caller. Read-path and cascade-delete
//! failures are logged and absorbed: a page render or an entity deletion must
//! not depend on storage availability.

use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use vitrine_core::models::{ResolvedUrl, UploadRequest, UploadTarget};
use vitrine_core::Config;
use vitrine_storage::{
    extract_key, Storage, StorageBackend, StorageError, StorageKey, StorageResult,
};

/// Outcome of a cascading delete, for logs and tests. Never an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub deleted: usize,
    pub failed: usize,
    /// URLs with no recoverable storage key
    pub skipped: usize,
}

pub struct MediaGateway {
    storage: Arc<dyn Storage>,
    signed_url_ttl: Duration,
    batch_concurrency: usize,
    last_timestamp_ms: AtomicU64,
}

impl MediaGateway {
    pub fn new(storage: Arc<dyn Storage>, signed_url_ttl: Duration, batch_concurrency: usize) -> Self {
        Self {
            storage,
            signed_url_ttl,
            batch_concurrency: batch_concurrency.max(1),
            last_timestamp_ms: AtomicU64::new(0),
        }
    }

    pub fn from_config(storage: Arc<dyn Storage>, config: &Config) -> Self {
        Self::new(
            storage,
            Duration::from_secs(config.signed_url_ttl_secs()),
            config.storage_batch_concurrency(),
        )
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn backend_type(&self) -> StorageBackend {
        self.storage.backend_type()
    }

    /// Wall-clock milliseconds, bumped past the last value handed out so two
    /// negotiations in the same millisecond still get distinct keys.
    fn next_timestamp_ms(&self) -> u64 {
        let now = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0);
        let mut last = self.last_timestamp_ms.load(Ordering::Relaxed);
        loop {
            let next = now.max(last + 1);
            match self.last_timestamp_ms.compare_exchange_weak(
                last,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }

    /// Negotiate an upload target for a new object.
    pub async fn request_upload(&self, request: &UploadRequest) -> StorageResult<UploadTarget> {
        let timestamp_ms = self.next_timestamp_ms();
        self.request_upload_at(request, timestamp_ms).await
    }

    /// Same as [`MediaGateway::request_upload`] with a caller-supplied timestamp.
    pub async fn request_upload_at(
        &self,
        request: &UploadRequest,
        timestamp_ms: u64,
    ) -> StorageResult<UploadTarget> {
        let key = StorageKey::derive(
            &request.entity_id,
            &request.variant_id,
            timestamp_ms,
            &request.file_name,
        );
        let start = std::time::Instant::now();

        let target = self
            .storage
            .negotiate_upload(&key, &request.content_type)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    key = %key,
                    backend = %self.backend_type(),
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Upload negotiation failed"
                );
                e
            })?;

        // The public URL is what gets persisted; it must lead back to the key.
        if extract_key(&target.public_url).as_ref() != Some(&key) {
            tracing::error!(
                key = %key,
                public_url = %target.public_url,
                "Backend returned a public URL that does not carry the storage key"
            );
            return Err(StorageError::Negotiation(
                "public URL does not contain the storage key".to_string(),
            ));
        }

        tracing::info!(
            key = %key,
            backend = %self.backend_type(),
            content_type = %request.content_type,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload negotiated"
        );

        Ok(target)
    }

    /// URL the caller should render for a stored canonical URL.
    ///
    /// Returns the input unchanged when it carries no storage key or when
    /// signing fails.
    pub async fn resolve_read_url(&self, canonical_url: &str) -> String {
        self.resolve(canonical_url).await.signed_url
    }

    /// Resolve each URL independently; output order matches input order.
    pub async fn resolve_read_urls(&self, canonical_urls: Vec<String>) -> Vec<ResolvedUrl> {
        let start = std::time::Instant::now();
        let count = canonical_urls.len();

        let resolved: Vec<ResolvedUrl> = stream::iter(canonical_urls)
            .map(|url| async move { self.resolve(&url).await })
            .buffered(self.batch_concurrency)
            .collect()
            .await;

        tracing::debug!(
            count,
            failed = resolved.iter().filter(|r| r.error.is_some()).count(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Resolved read URL batch"
        );

        resolved
    }

    async fn resolve(&self, canonical_url: &str) -> ResolvedUrl {
        let unchanged = |error: Option<String>| ResolvedUrl {
            original_url: canonical_url.to_string(),
            signed_url: canonical_url.to_string(),
            error,
        };

        let Some(key) = extract_key(canonical_url) else {
            tracing::debug!(url = %canonical_url, "No storage key in URL; returning it unchanged");
            return unchanged(None);
        };

        match self
            .storage
            .sign_get_url(&key, canonical_url, self.signed_url_ttl)
            .await
        {
            Ok(signed_url) => ResolvedUrl {
                original_url: canonical_url.to_string(),
                signed_url,
                error: None,
            },
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    key = %key,
                    backend = %self.backend_type(),
                    "Failed to sign read URL; falling back to canonical URL"
                );
                unchanged(Some(e.to_string()))
            }
        }
    }

    /// Best-effort delete of every object behind `canonical_urls`.
    ///
    /// Deletions start in input order with at most `batch_concurrency` in
    /// flight. A failing object never stops the others.
    pub async fn cascade_delete(&self, canonical_urls: &[String]) -> CascadeReport {
        let start = std::time::Instant::now();
        let mut report = CascadeReport::default();

        let mut keys = Vec::with_capacity(canonical_urls.len());
        for url in canonical_urls {
            match extract_key(url) {
                Some(key) => keys.push(key),
                None => {
                    tracing::warn!(url = %url, "Skipping delete: no storage key in URL");
                    report.skipped += 1;
                }
            }
        }

        let results: Vec<(StorageKey, StorageResult<()>)> = stream::iter(keys)
            .map(|key| async move {
                let result = self.storage.delete(&key).await;
                (key, result)
            })
            .buffer_unordered(self.batch_concurrency)
            .collect()
            .await;

        for (key, result) in results {
            match result {
                Ok(()) => report.deleted += 1,
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        key = %key,
                        backend = %self.backend_type(),
                        "Failed to delete object during cascade"
                    );
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            deleted = report.deleted,
            failed = report.failed,
            skipped = report.skipped,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Cascade delete finished"
        );

        report
    }
}
