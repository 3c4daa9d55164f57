//! Mock Storage implementation for testing

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use vitrine_storage::{
    canonical_url, Storage, StorageBackend, StorageError, StorageKey, StorageResult, UploadTarget,
};

pub const MOCK_BASE_URL: &str = "https://mock.example.com/media";

/// Mock storage that keeps object keys in memory
///
/// Individual keys can be made to fail on delete or sign, and an optional
/// per-call delay lets tests observe how many calls run at once.
pub struct MockStorage {
    objects: Mutex<HashSet<String>>,
    failing_deletes: Mutex<HashSet<String>>,
    failing_signs: Mutex<HashSet<String>>,
    signed: Mutex<Vec<String>>,
    fail_negotiation: AtomicBool,
    backend_type: StorageBackend,
    base_url: String,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::with_backend(StorageBackend::S3Cdn)
    }

    pub fn with_backend(backend_type: StorageBackend) -> Self {
        Self {
            objects: Mutex::new(HashSet::new()),
            failing_deletes: Mutex::new(HashSet::new()),
            failing_signs: Mutex::new(HashSet::new()),
            signed: Mutex::new(Vec::new()),
            fail_negotiation: AtomicBool::new(false),
            backend_type,
            base_url: MOCK_BASE_URL.to_string(),
            delay: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    /// Make every backend call sleep for `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Store an object under `key`
    pub fn insert(&self, key: &str) {
        self.objects.lock().unwrap().insert(key.to_string());
    }

    /// Check if an object exists in the mock storage
    pub fn has_object(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains(key)
    }

    pub fn fail_delete_for(&self, key: &str) {
        self.failing_deletes.lock().unwrap().insert(key.to_string());
    }

    pub fn fail_sign_for(&self, key: &str) {
        self.failing_signs.lock().unwrap().insert(key.to_string());
    }

    pub fn fail_negotiation(&self) {
        self.fail_negotiation.store(true, Ordering::SeqCst);
    }

    /// Keys passed to `sign_get_url`, in call order
    pub fn signed_keys(&self) -> Vec<String> {
        self.signed.lock().unwrap().clone()
    }

    /// Highest number of backend calls observed running at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        } else {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Default for MockStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn negotiate_upload(
        &self,
        key: &StorageKey,
        _content_type: &str,
    ) -> StorageResult<UploadTarget> {
        self.simulate_latency().await;
        if self.fail_negotiation.load(Ordering::SeqCst) {
            return Err(StorageError::Negotiation(
                "mock backend rejected upload".to_string(),
            ));
        }

        let token = match self.backend_type {
            StorageBackend::ManagedCloud => Some("mock-token".to_string()),
            _ => None,
        };

        Ok(UploadTarget {
            upload_url: format!("https://upload.mock.example.com/{}", key),
            public_url: self.public_url(key),
            key: key.to_string(),
            token,
        })
    }

    async fn delete(&self, key: &StorageKey) -> StorageResult<()> {
        self.simulate_latency().await;
        if self.failing_deletes.lock().unwrap().contains(key.as_str()) {
            return Err(StorageError::DeleteFailed(format!(
                "mock backend refused to delete {}",
                key
            )));
        }
        self.objects.lock().unwrap().remove(key.as_str());
        Ok(())
    }

    async fn sign_get_url(
        &self,
        key: &StorageKey,
        canonical_url: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.simulate_latency().await;
        self.signed.lock().unwrap().push(key.to_string());
        if self.failing_signs.lock().unwrap().contains(key.as_str()) {
            return Err(StorageError::Signing(format!(
                "mock backend cannot sign {}",
                key
            )));
        }

        match self.backend_type {
            StorageBackend::Local => Ok(canonical_url.to_string()),
            _ => Ok(format!(
                "{}?signature=mock&expires={}",
                canonical_url,
                expires_in.as_secs()
            )),
        }
    }

    fn public_url(&self, key: &StorageKey) -> String {
        canonical_url(&self.base_url, key)
    }

    fn backend_type(&self) -> StorageBackend {
        self.backend_type
    }
}
