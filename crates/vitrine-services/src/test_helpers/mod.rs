//! Test doubles for crates that drive the gateway.

pub mod mock_storage;

pub use mock_storage::{MockStorage, MOCK_BASE_URL};
