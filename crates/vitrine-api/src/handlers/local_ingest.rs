use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::validation::validate_content_type;
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use std::sync::Arc;
use vitrine_core::models::LocalIngestResponse;
use vitrine_core::AppError;
use vitrine_services::StorageKey;

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(format!("Invalid multipart body: {}", err.body_text()))
    }
}

/// Second phase of a local upload: write the bytes for a negotiated key
///
/// Multipart body with a `key` text field (as returned by upload
/// negotiation) and a `file` part. Only routed when the local backend is
/// active.
#[utoipa::path(
    post,
    path = "/api/v0/uploads/local",
    tag = "uploads",
    request_body(content_type = "multipart/form-data", description = "`key` field plus `file` part"),
    responses(
        (status = 201, description = "File stored", body = LocalIngestResponse),
        (status = 400, description = "Missing or invalid key or file", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 415, description = "Content type not allowed", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "ingest_local"))]
pub async fn ingest_local(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let local = state.local.as_ref().ok_or_else(|| {
        AppError::NotFound("Local ingestion is only available with the local storage backend".to_string())
    })?;

    let max_size = state.config.max_upload_size_bytes();
    let mut key: Option<String> = None;
    let mut file: Option<Bytes> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("key") => {
                key = Some(field.text().await.map_err(multipart_error)?);
            }
            Some("file") => {
                if let Some(content_type) = field.content_type() {
                    validate_content_type(content_type, state.config.allowed_content_types())?;
                }
                file = Some(field.bytes().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }

    let key = key.ok_or_else(|| AppError::InvalidInput("Missing 'key' field".to_string()))?;
    let key = StorageKey::parse(key.trim())?;
    let data = file.ok_or_else(|| AppError::InvalidInput("Missing 'file' part".to_string()))?;

    if data.is_empty() {
        return Err(AppError::InvalidInput("File is empty".to_string()).into());
    }
    if data.len() > max_size {
        return Err(AppError::PayloadTooLarge(format!(
            "File size {} exceeds the {} MB limit",
            data.len(),
            max_size / 1024 / 1024
        ))
        .into());
    }

    let public_url = local.ingest(&key, data).await?;

    Ok((
        StatusCode::CREATED,
        Json(LocalIngestResponse {
            public_url,
            key: key.into_string(),
        }),
    ))
}
