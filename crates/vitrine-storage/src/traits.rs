//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::keys::StorageKey;
use crate::StorageBackend;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use vitrine_core::models::UploadTarget;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Unknown or incomplete backend configuration. Fatal at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The backend refused to hand out an upload target.
    #[error("Upload negotiation failed: {0}")]
    Negotiation(String),

    /// Writing ingested bytes failed (local backend).
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    /// The backend could not produce a signed read URL.
    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// Implemented once per backend; exactly one implementation is active per
/// process. Implementations hold only long-lived, read-only state (clients,
/// credentials), so a single instance is shared by all concurrent requests.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Ask the backend where the caller should send the bytes for `key`.
    ///
    /// The returned `public_url` must contain `key` verbatim (see
    /// [`crate::keys::canonical_url`]).
    async fn negotiate_upload(
        &self,
        key: &StorageKey,
        content_type: &str,
    ) -> StorageResult<UploadTarget>;

    /// Delete a single object. Deleting a missing object succeeds.
    async fn delete(&self, key: &StorageKey) -> StorageResult<()>;

    /// Produce a time-limited read URL for `key`.
    ///
    /// Backends whose objects are publicly readable return `canonical_url`
    /// unchanged.
    async fn sign_get_url(
        &self,
        key: &StorageKey,
        canonical_url: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Canonical public URL for `key`.
    fn public_url(&self, key: &StorageKey) -> String;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
