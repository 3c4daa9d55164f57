//! Per-call deadline for storage backends.

use crate::keys::StorageKey;
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use vitrine_core::models::UploadTarget;

/// Wraps a backend so every network-bound call fails with
/// [`StorageError::Timeout`] once `timeout` elapses.
///
/// Dropping the returned future cancels the in-flight backend call.
#[derive(Clone)]
pub struct TimeoutStorage {
    inner: Arc<dyn Storage>,
    timeout: Duration,
}

impl TimeoutStorage {
    pub fn new(inner: Arc<dyn Storage>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn run<T, F>(&self, operation: &'static str, key: &StorageKey, fut: F) -> StorageResult<T>
    where
        T: Send,
        F: Future<Output = StorageResult<T>> + Send,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    operation,
                    key = %key,
                    backend = %self.inner.backend_type(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Storage operation timed out"
                );
                Err(StorageError::Timeout(self.timeout))
            }
        }
    }
}

#[async_trait]
impl Storage for TimeoutStorage {
    async fn negotiate_upload(
        &self,
        key: &StorageKey,
        content_type: &str,
    ) -> StorageResult<UploadTarget> {
        self.run(
            "negotiate_upload",
            key,
            self.inner.negotiate_upload(key, content_type),
        )
        .await
    }

    async fn delete(&self, key: &StorageKey) -> StorageResult<()> {
        self.run("delete", key, self.inner.delete(key)).await
    }

    async fn sign_get_url(
        &self,
        key: &StorageKey,
        canonical_url: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.run(
            "sign_get_url",
            key,
            self.inner.sign_get_url(key, canonical_url, expires_in),
        )
        .await
    }

    fn public_url(&self, key: &StorageKey) -> String {
        self.inner.public_url(key)
    }

    fn backend_type(&self) -> StorageBackend {
        self.inner.backend_type()
    }
}
