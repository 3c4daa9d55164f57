//! Vitrine Services Layer
//!
//! Gateway orchestration on top of the active storage backend: upload
//! negotiation, read URL resolution and cascading deletes. The API crate
//! depends on this facade and keeps only thin HTTP handling itself.

pub mod gateway;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use gateway::{CascadeReport, MediaGateway};
#[cfg(feature = "storage-local")]
pub use vitrine_storage::LocalStorage;
pub use vitrine_storage::{
    create_storage, extract_key, ConfiguredStorage, Storage, StorageBackend, StorageError,
    StorageKey, StorageResult,
};
