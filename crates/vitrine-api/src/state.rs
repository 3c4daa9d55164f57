//! Application state shared by all handlers.

use std::sync::Arc;
use vitrine_core::Config;
use vitrine_services::{LocalStorage, MediaGateway, StorageBackend};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub gateway: Arc<MediaGateway>,
    /// Present only when the local backend is active; the ingestion route
    /// writes through it.
    pub local: Option<Arc<LocalStorage>>,
}

impl AppState {
    pub fn new(config: Config, gateway: MediaGateway, local: Option<Arc<LocalStorage>>) -> Self {
        Self {
            config,
            gateway: Arc::new(gateway),
            local,
        }
    }

    pub fn backend(&self) -> StorageBackend {
        self.gateway.backend_type()
    }
}
