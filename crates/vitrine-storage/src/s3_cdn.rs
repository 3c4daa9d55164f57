use crate::keys::{canonical_url, contains_key_root, StorageKey};
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStoreExt, Result as ObjectResult};
use std::time::Duration;
use vitrine_core::models::UploadTarget;

/// Settings for [`S3CdnStorage`]
#[derive(Debug, Clone)]
pub struct S3CdnSettings {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible providers (e.g., "http://localhost:9000" for MinIO)
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Hostname of the CDN fronting the bucket, without scheme or path
    pub cdn_hostname: Option<String>,
    /// Validity of pre-signed PUT URLs handed out at negotiation
    pub upload_url_ttl: Duration,
}

/// S3-compatible storage, optionally fronted by a CDN
///
/// Callers upload directly with a pre-signed PUT URL. Reads always go
/// through pre-signed GET URLs, since the bucket is assumed private.
#[derive(Clone)]
pub struct S3CdnStorage {
    store: AmazonS3,
    bucket: String,
    region: String,
    endpoint_url: Option<String>,
    cdn_hostname: Option<String>,
    upload_url_ttl: Duration,
}

impl S3CdnStorage {
    pub fn new(settings: S3CdnSettings) -> StorageResult<Self> {
        let S3CdnSettings {
            bucket,
            region,
            endpoint,
            access_key_id,
            secret_access_key,
            cdn_hostname,
            upload_url_ttl,
        } = settings;

        let cdn_hostname = cdn_hostname
            .map(|host| {
                host.trim_start_matches("https://")
                    .trim_start_matches("http://")
                    .trim_end_matches('/')
                    .to_string()
            })
            .filter(|host| !host.is_empty());

        if let Some(ref host) = cdn_hostname {
            if host.contains('/') {
                return Err(StorageError::Config(format!(
                    "CDN hostname must not contain a path: {}",
                    host
                )));
            }
        }

        if contains_key_root(&bucket) || endpoint.as_deref().is_some_and(contains_key_root) {
            return Err(StorageError::Config(format!(
                "S3 bucket and endpoint must not contain a 'designs' segment (bucket {})",
                bucket
            )));
        }

        // Build AmazonS3 object store from environment and explicit settings.
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let (Some(id), Some(secret)) = (access_key_id, secret_access_key) {
            builder = builder
                .with_access_key_id(id)
                .with_secret_access_key(secret);
        }

        if let Some(ref endpoint) = endpoint {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::Config(e.to_string()))?;

        Ok(S3CdnStorage {
            store,
            bucket,
            region,
            endpoint_url: endpoint,
            cdn_hostname,
            upload_url_ttl,
        })
    }

    /// Base URL that keys are appended to.
    ///
    /// A CDN record can only point at the origin host, so the bucket name
    /// stays in the path when serving through the CDN.
    fn public_base(&self) -> String {
        if let Some(ref host) = self.cdn_hostname {
            format!("https://{}/{}", host, self.bucket)
        } else if let Some(ref endpoint) = self.endpoint_url {
            // Path-style addressing for S3-compatible providers: {endpoint}/{bucket}/{key}
            format!("{}/{}", endpoint.trim_end_matches('/'), self.bucket)
        } else {
            format!("https://{}.s3.{}.amazonaws.com", self.bucket, self.region)
        }
    }

    async fn presign(
        &self,
        method: Method,
        key: &StorageKey,
        expires_in: Duration,
    ) -> ObjectResult<String> {
        let location = Path::from(key.as_str());
        let url = self.store.signed_url(method, &location, expires_in).await?;
        Ok(url.to_string())
    }
}

#[async_trait]
impl Storage for S3CdnStorage {
    async fn negotiate_upload(
        &self,
        key: &StorageKey,
        content_type: &str,
    ) -> StorageResult<UploadTarget> {
        let start = std::time::Instant::now();

        let upload_url = self
            .presign(Method::PUT, key, self.upload_url_ttl)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload presign failed"
                );
                StorageError::Negotiation(e.to_string())
            })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            content_type = %content_type,
            ttl_secs = self.upload_url_ttl.as_secs(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload negotiated"
        );

        Ok(UploadTarget {
            upload_url,
            public_url: self.public_url(key),
            key: key.to_string(),
            token: None,
        })
    }

    async fn delete(&self, key: &StorageKey) -> StorageResult<()> {
        let start = std::time::Instant::now();
        let location = Path::from(key.as_str());

        let result: ObjectResult<_> = self.store.delete(&location).await;

        match result {
            Ok(()) => {}
            Err(ObjectStoreError::NotFound { .. }) => {
                tracing::debug!(bucket = %self.bucket, key = %key, "S3 delete: object already absent");
                return Ok(());
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 delete failed"
                );
                return Err(StorageError::DeleteFailed(e.to_string()));
            }
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    async fn sign_get_url(
        &self,
        key: &StorageKey,
        _canonical_url: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.presign(Method::GET, key, expires_in)
            .await
            .map_err(|e| StorageError::Signing(e.to_string()))
    }

    fn public_url(&self, key: &StorageKey) -> String {
        canonical_url(&self.public_base(), key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3Cdn
    }
}

#[cfg(all(test, feature = "storage-s3"))]
mod tests {
    use super::*;

    fn settings() -> S3CdnSettings {
        S3CdnSettings {
            bucket: "ic-catalogue".to_string(),
            region: "eu-west-1".to_string(),
            endpoint: None,
            access_key_id: Some("AKIDEXAMPLE".to_string()),
            secret_access_key: Some("wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY".to_string()),
            cdn_hostname: None,
            upload_url_ttl: Duration::from_secs(300),
        }
    }

    fn key() -> StorageKey {
        StorageKey::parse("designs/ind004/white/123.jpg").unwrap()
    }

    #[test]
    fn test_cdn_url_keeps_bucket_segment() {
        let storage = S3CdnStorage::new(S3CdnSettings {
            cdn_hostname: Some("cdn.example.com".to_string()),
            ..settings()
        })
        .unwrap();

        assert_eq!(
            storage.public_url(&key()),
            "https://cdn.example.com/ic-catalogue/designs/ind004/white/123.jpg"
        );
    }

    #[test]
    fn test_cdn_hostname_scheme_is_stripped() {
        let storage = S3CdnStorage::new(S3CdnSettings {
            cdn_hostname: Some("https://cdn.example.com/".to_string()),
            ..settings()
        })
        .unwrap();

        assert_eq!(
            storage.public_url(&key()),
            "https://cdn.example.com/ic-catalogue/designs/ind004/white/123.jpg"
        );
    }

    #[test]
    fn test_url_without_cdn() {
        let storage = S3CdnStorage::new(settings()).unwrap();
        assert_eq!(
            storage.public_url(&key()),
            "https://ic-catalogue.s3.eu-west-1.amazonaws.com/designs/ind004/white/123.jpg"
        );

        let storage = S3CdnStorage::new(S3CdnSettings {
            endpoint: Some("http://localhost:9000/".to_string()),
            ..settings()
        })
        .unwrap();
        assert_eq!(
            storage.public_url(&key()),
            "http://localhost:9000/ic-catalogue/designs/ind004/white/123.jpg"
        );
    }

    #[test]
    fn test_rejects_designs_bucket_and_cdn_path() {
        let result = S3CdnStorage::new(S3CdnSettings {
            bucket: "designs".to_string(),
            ..settings()
        });
        assert!(matches!(result, Err(StorageError::Config(_))));

        let result = S3CdnStorage::new(S3CdnSettings {
            cdn_hostname: Some("cdn.example.com/ic-catalogue".to_string()),
            ..settings()
        });
        assert!(matches!(result, Err(StorageError::Config(_))));
    }

    #[tokio::test]
    async fn test_negotiate_presigns_put() {
        let storage = S3CdnStorage::new(S3CdnSettings {
            cdn_hostname: Some("cdn.example.com".to_string()),
            ..settings()
        })
        .unwrap();

        let target = storage.negotiate_upload(&key(), "image/jpeg").await.unwrap();

        // Uploads go to the origin, never through the CDN.
        assert!(!target.upload_url.contains("cdn.example.com"));
        assert!(target.upload_url.contains("ic-catalogue"));
        assert!(target.upload_url.contains("designs/ind004/white/123.jpg?"));
        assert!(target.upload_url.contains("X-Amz-Signature="));
        assert!(target.upload_url.contains("X-Amz-Expires=300"));
        assert_eq!(
            target.public_url,
            "https://cdn.example.com/ic-catalogue/designs/ind004/white/123.jpg"
        );
        assert!(target.token.is_none());
    }

    #[tokio::test]
    async fn test_sign_get_url_is_time_limited() {
        let storage = S3CdnStorage::new(settings()).unwrap();
        let canonical = storage.public_url(&key());

        let signed = storage
            .sign_get_url(&key(), &canonical, Duration::from_secs(3600))
            .await
            .unwrap();

        assert_ne!(signed, canonical);
        assert!(signed.contains("designs/ind004/white/123.jpg"));
        assert!(signed.contains("X-Amz-Expires=3600"));
        assert!(signed.contains("X-Amz-Signature="));
    }

    fn endpoint_settings(endpoint: String) -> S3CdnSettings {
        S3CdnSettings {
            endpoint: Some(endpoint),
            ..settings()
        }
    }

    #[tokio::test]
    async fn test_delete_missing_object_is_ok() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/ic-catalogue/designs/ind004/white/123.jpg")
            .with_status(404)
            .with_header("content-type", "application/xml")
            .with_body(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
                 <Error><Code>NoSuchKey</Code><Message>The specified key does not exist.</Message></Error>",
            )
            .expect(1)
            .create_async()
            .await;

        let storage = S3CdnStorage::new(endpoint_settings(server.url())).unwrap();
        storage.delete(&key()).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_existing_object() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/ic-catalogue/designs/ind004/white/123.jpg")
            .with_status(204)
            .expect(1)
            .create_async()
            .await;

        let storage = S3CdnStorage::new(endpoint_settings(server.url())).unwrap();
        storage.delete(&key()).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_denied_is_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("DELETE", "/ic-catalogue/designs/ind004/white/123.jpg")
            .with_status(403)
            .with_header("content-type", "application/xml")
            .with_body(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
                 <Error><Code>AccessDenied</Code><Message>Access Denied</Message></Error>",
            )
            .create_async()
            .await;

        let storage = S3CdnStorage::new(endpoint_settings(server.url())).unwrap();
        let result = storage.delete(&key()).await;

        assert!(matches!(result, Err(StorageError::DeleteFailed(_))));
    }
}
