use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use crate::validation::validate_content_type;
use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;
use validator::Validate;
use vitrine_core::models::{UploadRequest, UploadResponse};

/// Negotiate where the caller should upload a design image or video
///
/// The response `publicURL` is the canonical URL to persist once the upload
/// has succeeded.
#[utoipa::path(
    post,
    path = "/api/v0/uploads",
    tag = "uploads",
    request_body = UploadRequest,
    responses(
        (status = 200, description = "Upload target negotiated", body = UploadResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 415, description = "Content type not allowed", body = ErrorResponse),
        (status = 502, description = "Storage backend rejected the upload", body = ErrorResponse),
        (status = 504, description = "Storage backend timed out", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, request),
    fields(
        file_name = %request.file_name,
        content_type = %request.content_type,
        entity_id = %request.entity_id,
        variant_id = %request.variant_id,
        operation = "request_upload"
    )
)]
pub async fn request_upload(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<UploadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate()?;
    validate_content_type(&request.content_type, state.config.allowed_content_types())?;

    let target = state.gateway.request_upload(&request).await?;

    Ok(Json(UploadResponse {
        target,
        backend: state.backend(),
    }))
}
