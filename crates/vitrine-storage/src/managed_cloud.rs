use crate::keys::{canonical_url, contains_key_root, StorageKey};
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use vitrine_core::models::UploadTarget;

const STORAGE_API_PATH: &str = "storage/v1";
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Managed cloud object storage reached over its REST API
///
/// Authenticates with a service key. Uploads go straight from the caller to
/// the provider using a signed upload URL plus token; reads are either
/// public or signed per request depending on the bucket's visibility.
#[derive(Clone)]
pub struct ManagedCloudStorage {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
    bucket: String,
    public_bucket: bool,
}

#[derive(Debug, Deserialize)]
struct SignedUploadResponse {
    url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignRequest {
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

#[derive(Debug, Serialize)]
struct RemoveRequest<'a> {
    prefixes: [&'a str; 1],
}

impl ManagedCloudStorage {
    /// Create a new ManagedCloudStorage instance
    ///
    /// # Arguments
    /// * `base_url` - Project URL of the provider (e.g., "https://project.example.co")
    /// * `service_key` - Service-role key; sent as bearer token and `apikey` header
    /// * `bucket` - Bucket holding design media
    /// * `public_bucket` - Whether objects are readable without a signature
    pub fn new(
        base_url: String,
        service_key: String,
        bucket: String,
        public_bucket: bool,
    ) -> StorageResult<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();

        Url::parse(&base_url).map_err(|e| {
            StorageError::Config(format!("Invalid MANAGED_CLOUD_URL {}: {}", base_url, e))
        })?;

        if contains_key_root(&base_url) || contains_key_root(&bucket) {
            return Err(StorageError::Config(format!(
                "Managed cloud URL and bucket must not contain a 'designs' segment (url {}, bucket {})",
                base_url, bucket
            )));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| StorageError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(ManagedCloudStorage {
            client,
            base_url,
            service_key,
            bucket,
            public_bucket,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, STORAGE_API_PATH, path)
    }

    /// Turn a provider-relative path (`/object/...`) into an absolute URL.
    fn absolute_url(&self, relative: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            STORAGE_API_PATH,
            relative.trim_start_matches('/')
        )
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
    }
}

/// Provider error bodies are short JSON documents; keep them for the log.
async fn error_body(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|e| format!("<unreadable body: {}>", e))
}

#[async_trait]
impl Storage for ManagedCloudStorage {
    async fn negotiate_upload(
        &self,
        key: &StorageKey,
        content_type: &str,
    ) -> StorageResult<UploadTarget> {
        let start = std::time::Instant::now();
        let endpoint = self.api_url(&format!("object/upload/sign/{}/{}", self.bucket, key));

        let response = self
            .authorized(self.client.post(&endpoint))
            .send()
            .await
            .map_err(|e| StorageError::Negotiation(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            tracing::error!(
                status = %status,
                body = %body,
                bucket = %self.bucket,
                key = %key,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Managed cloud upload negotiation failed"
            );
            return Err(StorageError::Negotiation(format!(
                "Provider returned {} for signed upload URL",
                status
            )));
        }

        let signed: SignedUploadResponse = response
            .json()
            .await
            .map_err(|e| StorageError::Negotiation(format!("Malformed provider response: {}", e)))?;

        let upload_url = self.absolute_url(&signed.url);
        let token = Url::parse(&upload_url)
            .ok()
            .and_then(|url| {
                url.query_pairs()
                    .find(|(name, _)| name == "token")
                    .map(|(_, value)| value.into_owned())
            })
            .ok_or_else(|| {
                StorageError::Negotiation("Provider upload URL carries no token".to_string())
            })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            content_type = %content_type,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Managed cloud upload negotiated"
        );

        Ok(UploadTarget {
            upload_url,
            public_url: self.public_url(key),
            key: key.to_string(),
            token: Some(token),
        })
    }

    async fn delete(&self, key: &StorageKey) -> StorageResult<()> {
        let start = std::time::Instant::now();
        let endpoint = self.api_url(&format!("object/{}", self.bucket));

        let response = self
            .authorized(self.client.delete(&endpoint))
            .json(&RemoveRequest {
                prefixes: [key.as_str()],
            })
            .send()
            .await
            .map_err(|e| StorageError::DeleteFailed(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!(bucket = %self.bucket, key = %key, "Managed cloud delete: object already absent");
            return Ok(());
        }
        if !status.is_success() {
            let body = error_body(response).await;
            tracing::error!(
                status = %status,
                body = %body,
                bucket = %self.bucket,
                key = %key,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Managed cloud delete failed"
            );
            return Err(StorageError::DeleteFailed(format!(
                "Provider returned {} for delete",
                status
            )));
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Managed cloud delete successful"
        );

        Ok(())
    }

    async fn sign_get_url(
        &self,
        key: &StorageKey,
        canonical_url: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        if self.public_bucket {
            return Ok(canonical_url.to_string());
        }

        let endpoint = self.api_url(&format!("object/sign/{}/{}", self.bucket, key));
        let response = self
            .authorized(self.client.post(&endpoint))
            .json(&SignRequest {
                expires_in: expires_in.as_secs(),
            })
            .send()
            .await
            .map_err(|e| StorageError::Signing(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            return Err(StorageError::Signing(format!(
                "Provider returned {} for signed URL: {}",
                status, body
            )));
        }

        let signed: SignResponse = response
            .json()
            .await
            .map_err(|e| StorageError::Signing(format!("Malformed provider response: {}", e)))?;

        Ok(self.absolute_url(&signed.signed_url))
    }

    fn public_url(&self, key: &StorageKey) -> String {
        let base = self.api_url(&format!("object/public/{}", self.bucket));
        canonical_url(&base, key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::ManagedCloud
    }
}

#[cfg(all(test, feature = "storage-managed-cloud"))]
mod tests {
    use super::*;
    use mockito::Matcher;

    const SERVICE_KEY: &str = "service-key";

    fn storage(base_url: &str, public_bucket: bool) -> ManagedCloudStorage {
        ManagedCloudStorage::new(
            base_url.to_string(),
            SERVICE_KEY.to_string(),
            "catalogue".to_string(),
            public_bucket,
        )
        .unwrap()
    }

    fn key() -> StorageKey {
        StorageKey::derive("ind004", "white", 123, "a.jpg")
    }

    #[test]
    fn test_public_url_contains_key() {
        let storage = storage("https://project.example.co/", false);
        assert_eq!(
            storage.public_url(&key()),
            "https://project.example.co/storage/v1/object/public/catalogue/designs/ind004/white/123.jpg"
        );
    }

    #[test]
    fn test_rejects_designs_bucket() {
        let result = ManagedCloudStorage::new(
            "https://project.example.co".to_string(),
            SERVICE_KEY.to_string(),
            "designs".to_string(),
            false,
        );
        assert!(matches!(result, Err(StorageError::Config(_))));
    }

    #[tokio::test]
    async fn test_negotiate_returns_upload_url_and_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock(
                "POST",
                "/storage/v1/object/upload/sign/catalogue/designs/ind004/white/123.jpg",
            )
            .match_header("authorization", "Bearer service-key")
            .match_header("apikey", SERVICE_KEY)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"url":"/object/upload/sign/catalogue/designs/ind004/white/123.jpg?token=tok-123"}"#,
            )
            .create_async()
            .await;

        let storage = storage(&server.url(), false);
        let target = storage.negotiate_upload(&key(), "image/jpeg").await.unwrap();

        mock.assert_async().await;
        assert_eq!(
            target.upload_url,
            format!(
                "{}/storage/v1/object/upload/sign/catalogue/designs/ind004/white/123.jpg?token=tok-123",
                server.url()
            )
        );
        assert_eq!(target.token.as_deref(), Some("tok-123"));
        assert_eq!(target.key, "designs/ind004/white/123.jpg");
        assert!(target.public_url.ends_with("/designs/ind004/white/123.jpg"));
    }

    #[tokio::test]
    async fn test_negotiate_maps_provider_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", Matcher::Any)
            .with_status(400)
            .with_body(r#"{"error":"Bucket not found"}"#)
            .create_async()
            .await;

        let storage = storage(&server.url(), false);
        let result = storage.negotiate_upload(&key(), "image/jpeg").await;
        assert!(matches!(result, Err(StorageError::Negotiation(_))));
    }

    #[tokio::test]
    async fn test_sign_private_bucket() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock(
                "POST",
                "/storage/v1/object/sign/catalogue/designs/ind004/white/123.jpg",
            )
            .match_body(Matcher::Json(serde_json::json!({"expiresIn": 3600})))
            .with_status(200)
            .with_body(
                r#"{"signedURL":"/object/sign/catalogue/designs/ind004/white/123.jpg?token=abc"}"#,
            )
            .create_async()
            .await;

        let storage = storage(&server.url(), false);
        let canonical = storage.public_url(&key());
        let signed = storage
            .sign_get_url(&key(), &canonical, Duration::from_secs(3600))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(
            signed,
            format!(
                "{}/storage/v1/object/sign/catalogue/designs/ind004/white/123.jpg?token=abc",
                server.url()
            )
        );
    }

    #[tokio::test]
    async fn test_sign_public_bucket_skips_provider() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let storage = storage(&server.url(), true);
        let canonical = storage.public_url(&key());
        let signed = storage
            .sign_get_url(&key(), &canonical, Duration::from_secs(3600))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(signed, canonical);
    }

    #[tokio::test]
    async fn test_delete_sends_prefix_and_treats_404_as_success() {
        let mut server = mockito::Server::new_async().await;
        let ok = server
            .mock("DELETE", "/storage/v1/object/catalogue")
            .match_body(Matcher::Json(
                serde_json::json!({"prefixes": ["designs/ind004/white/123.jpg"]}),
            ))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let storage = storage(&server.url(), false);
        storage.delete(&key()).await.unwrap();
        ok.assert_async().await;

        let mut missing_server = mockito::Server::new_async().await;
        missing_server
            .mock("DELETE", "/storage/v1/object/catalogue")
            .with_status(404)
            .create_async()
            .await;
        let storage = self::storage(&missing_server.url(), false);
        storage.delete(&key()).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_maps_server_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/storage/v1/object/catalogue")
            .with_status(500)
            .create_async()
            .await;

        let storage = storage(&server.url(), false);
        let result = storage.delete(&key()).await;
        assert!(matches!(result, Err(StorageError::DeleteFailed(_))));
    }
}
