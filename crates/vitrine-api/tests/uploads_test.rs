//! Upload negotiation and local ingestion integration tests.
//!
//! Run with: `cargo test -p vitrine-api --test uploads_test`

mod helpers;

use axum_test::multipart::{MultipartForm, Part};
use helpers::{api_path, setup_local_app, setup_local_app_with, setup_mock_app, LOCAL_BASE_URL};
use serde_json::{json, Value};
use std::sync::Arc;
use vitrine_core::StorageBackend;
use vitrine_services::test_helpers::{MockStorage, MOCK_BASE_URL};

const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

async fn negotiate(app: &helpers::TestApp, body: Value) -> axum_test::TestResponse {
    app.client().post(&api_path("/uploads")).json(&body).await
}

fn front_jpeg() -> Value {
    json!({
        "fileName": "front.jpg",
        "contentType": "image/jpeg",
        "entityID": "IND004",
        "variantID": "white"
    })
}

#[tokio::test]
async fn test_local_upload_roundtrip() {
    let app = setup_local_app().await;

    let response = negotiate(&app, front_jpeg()).await;
    assert_eq!(response.status_code(), 200);
    let target: Value = response.json();

    let key = target["key"].as_str().unwrap().to_string();
    assert!(key.starts_with("designs/IND004/white/"));
    assert!(key.ends_with(".jpg"));
    assert_eq!(target["backend"], "local");
    assert_eq!(target["uploadURL"], helpers::LOCAL_INGEST_URL);
    assert_eq!(
        target["publicURL"].as_str().unwrap(),
        format!("{}/{}", LOCAL_BASE_URL, key)
    );
    assert!(target.get("token").is_none());

    let form = MultipartForm::new()
        .add_text("key", key.clone())
        .add_part(
            "file",
            Part::bytes(JPEG_BYTES.to_vec())
                .file_name("front.jpg")
                .mime_type("image/jpeg"),
        );
    let response = app
        .client()
        .post(&api_path("/uploads/local"))
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), 201);
    let stored: Value = response.json();
    assert_eq!(stored["publicURL"], target["publicURL"]);
    assert_eq!(stored["key"], key.as_str());

    assert_eq!(
        tokio::fs::read(app.stored_file(&key)).await.unwrap(),
        JPEG_BYTES
    );

    // Served back under the local media mount
    let response = app.client().get(&format!("/media/{}", key)).await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.as_bytes().as_ref(), JPEG_BYTES);
}

#[tokio::test]
async fn test_consecutive_negotiations_get_distinct_keys() {
    let app = setup_local_app().await;

    let first: Value = negotiate(&app, front_jpeg()).await.json();
    let second: Value = negotiate(&app, front_jpeg()).await.json();

    assert_ne!(first["key"], second["key"]);
}

#[tokio::test]
async fn test_missing_identifiers_use_placeholders() {
    let app = setup_local_app().await;

    let response = negotiate(
        &app,
        json!({ "fileName": "clip.mp4", "contentType": "video/mp4" }),
    )
    .await;
    assert_eq!(response.status_code(), 200);
    let target: Value = response.json();
    assert!(target["key"]
        .as_str()
        .unwrap()
        .starts_with("designs/unknown/default/"));
}

#[tokio::test]
async fn test_disallowed_content_type_is_rejected() {
    let app = setup_local_app().await;

    let response = negotiate(
        &app,
        json!({ "fileName": "catalogue.pdf", "contentType": "application/pdf", "entityID": "IND004" }),
    )
    .await;
    assert_eq!(response.status_code(), 415);
    let body: Value = response.json();
    assert_eq!(body["code"], "UNSUPPORTED_MEDIA_TYPE");
}

#[tokio::test]
async fn test_content_type_parameters_are_ignored() {
    let app = setup_local_app().await;

    let response = negotiate(
        &app,
        json!({ "fileName": "a.png", "contentType": "Image/PNG; charset=binary" }),
    )
    .await;
    assert_eq!(response.status_code(), 200);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = setup_local_app().await;

    let response = negotiate(&app, json!({ "contentType": "image/jpeg" })).await;
    assert_eq!(response.status_code(), 400);

    let response = negotiate(
        &app,
        json!({ "fileName": "", "contentType": "image/jpeg" }),
    )
    .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_ingest_rejects_invalid_key() {
    let app = setup_local_app().await;

    for key in ["../etc/passwd", "designs/../../escape.jpg", "other/a/b/1.jpg"] {
        let form = MultipartForm::new().add_text("key", key).add_part(
            "file",
            Part::bytes(JPEG_BYTES.to_vec())
                .file_name("a.jpg")
                .mime_type("image/jpeg"),
        );
        let response = app
            .client()
            .post(&api_path("/uploads/local"))
            .multipart(form)
            .await;
        assert_eq!(response.status_code(), 400, "key {}", key);
    }
}

#[tokio::test]
async fn test_ingest_requires_file() {
    let app = setup_local_app().await;

    let form = MultipartForm::new().add_text("key", "designs/IND004/white/1.jpg");
    let response = app
        .client()
        .post(&api_path("/uploads/local"))
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_ingest_rejects_disallowed_part_type() {
    let app = setup_local_app().await;

    let form = MultipartForm::new()
        .add_text("key", "designs/IND004/white/1.pdf")
        .add_part(
            "file",
            Part::bytes(b"%PDF-1.4".to_vec())
                .file_name("a.pdf")
                .mime_type("application/pdf"),
        );
    let response = app
        .client()
        .post(&api_path("/uploads/local"))
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), 415);
}

#[tokio::test]
async fn test_ingest_enforces_size_limit() {
    let app = setup_local_app_with(|config| vitrine_core::GatewayConfig {
        max_upload_size_bytes: 16,
        ..config
    })
    .await;

    let form = MultipartForm::new()
        .add_text("key", "designs/IND004/white/1.jpg")
        .add_part(
            "file",
            Part::bytes(vec![0u8; 1024])
                .file_name("big.jpg")
                .mime_type("image/jpeg"),
        );
    let response = app
        .client()
        .post(&api_path("/uploads/local"))
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), 413);
    assert!(!app.stored_file("designs/IND004/white/1.jpg").exists());
}

#[tokio::test]
async fn test_ingest_route_absent_for_remote_backends() {
    let app = setup_mock_app(Arc::new(MockStorage::new()));

    let form = MultipartForm::new().add_text("key", "designs/a/b/1.jpg");
    let response = app
        .client()
        .post(&api_path("/uploads/local"))
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_managed_cloud_negotiation_carries_token() {
    let storage = Arc::new(MockStorage::with_backend(StorageBackend::ManagedCloud));
    let app = setup_mock_app(storage);

    let response = negotiate(&app, front_jpeg()).await;
    assert_eq!(response.status_code(), 200);
    let target: Value = response.json();
    assert_eq!(target["backend"], "managed-cloud");
    assert_eq!(target["token"], "mock-token");
    assert!(target["publicURL"]
        .as_str()
        .unwrap()
        .starts_with(&format!("{}/designs/IND004/white/", MOCK_BASE_URL)));
}

#[tokio::test]
async fn test_backend_rejection_is_bad_gateway() {
    let storage = Arc::new(MockStorage::new());
    storage.fail_negotiation();
    let app = setup_mock_app(storage);

    let response = negotiate(&app, front_jpeg()).await;
    assert_eq!(response.status_code(), 502);
    let body: Value = response.json();
    assert_eq!(body["code"], "UPLOAD_FAILED");
    assert_eq!(body["recoverable"], true);
}
