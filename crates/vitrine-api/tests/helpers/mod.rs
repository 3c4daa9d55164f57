//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p vitrine-api`.

#![allow(dead_code)]

use axum_test::TestServer;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use vitrine_api::constants;
use vitrine_api::setup::{build_app, routes};
use vitrine_api::state::AppState;
use vitrine_core::{Config, GatewayConfig, StorageBackend};
use vitrine_services::test_helpers::MockStorage;
use vitrine_services::MediaGateway;

pub const LOCAL_BASE_URL: &str = "http://localhost:4000/media";
pub const LOCAL_INGEST_URL: &str = "http://localhost:4000/api/v0/uploads/local";

/// API path prefix for tests (e.g. `/api/v0`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Test application: server plus the resources it owns.
pub struct TestApp {
    pub server: TestServer,
    pub storage_root: Option<PathBuf>,
    _temp_dir: Option<TempDir>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Path of `key` under the local storage root.
    pub fn stored_file(&self, key: &str) -> PathBuf {
        self.storage_root
            .as_ref()
            .expect("local backend only")
            .join(key)
    }
}

pub fn local_config(root: &std::path::Path) -> GatewayConfig {
    GatewayConfig {
        storage_backend: Some(StorageBackend::Local),
        local_storage_path: Some(root.to_string_lossy().into_owned()),
        local_storage_base_url: Some(LOCAL_BASE_URL.to_string()),
        local_ingest_url: Some(LOCAL_INGEST_URL.to_string()),
        ..GatewayConfig::default()
    }
}

/// App wired exactly as in production, on the local backend in a temp dir.
pub async fn setup_local_app() -> TestApp {
    setup_local_app_with(|config| config).await
}

pub async fn setup_local_app_with(
    customize: impl FnOnce(GatewayConfig) -> GatewayConfig,
) -> TestApp {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path().to_path_buf();
    let config = Config::from(customize(local_config(&root)));

    let (_state, app) = build_app(config).await.expect("Failed to build app");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        storage_root: Some(root),
        _temp_dir: Some(temp_dir),
    }
}

/// App backed by an in-memory storage double.
pub fn setup_mock_app(storage: Arc<MockStorage>) -> TestApp {
    let config = Config::from(GatewayConfig {
        storage_backend: Some(storage_backend(&storage)),
        ..GatewayConfig::default()
    });

    let gateway = MediaGateway::new(
        storage,
        Duration::from_secs(config.signed_url_ttl_secs()),
        config.storage_batch_concurrency(),
    );
    let state = Arc::new(AppState::new(config.clone(), gateway, None));

    let app = routes::setup_routes(&config, state).expect("Failed to setup routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        storage_root: None,
        _temp_dir: None,
    }
}

fn storage_backend(storage: &MockStorage) -> StorageBackend {
    use vitrine_services::Storage;
    storage.backend_type()
}
