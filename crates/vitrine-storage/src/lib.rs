//! Vitrine Storage Library
//!
//! Storage abstraction for uploaded design media. It includes the `Storage`
//! trait and implementations for the local filesystem, a managed cloud object
//! store and an S3-compatible store fronted by a CDN.
//!
//! # Storage key format
//!
//! Every backend stores objects under the same key layout:
//!
//! `designs/{entity_id}/{variant_id}/{timestamp_ms}.{ext}`
//!
//! Identifiers are restricted to `[A-Za-z0-9-]`. Every public URL a backend
//! hands out contains the key verbatim, starting at the `designs/` segment,
//! which is how a key is recovered from a persisted URL. Key derivation and
//! recovery live in the `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-managed-cloud")]
pub mod managed_cloud;
#[cfg(feature = "storage-s3")]
pub mod s3_cdn;
pub mod timeout;
pub mod traits;

// Re-export commonly used types
pub use factory::{create_storage, ConfiguredStorage};
pub use keys::{canonical_url, extract_key, StorageKey};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-managed-cloud")]
pub use managed_cloud::ManagedCloudStorage;
#[cfg(feature = "storage-s3")]
pub use s3_cdn::{S3CdnSettings, S3CdnStorage};
pub use timeout::TimeoutStorage;
pub use traits::{Storage, StorageError, StorageResult};
pub use vitrine_core::models::UploadTarget;
pub use vitrine_core::StorageBackend;
