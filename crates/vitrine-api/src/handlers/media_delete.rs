use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;
use vitrine_core::models::{DeleteMediaRequest, MessageResponse};

/// Delete the stored objects behind one or more canonical URLs
///
/// Best effort: objects that cannot be deleted are logged and skipped, and
/// the call still succeeds. Batches have no size cap and may be empty; the
/// gateway bounds how many deletes run at once.
#[utoipa::path(
    delete,
    path = "/api/v0/media",
    tag = "media",
    request_body = DeleteMediaRequest,
    responses(
        (status = 200, description = "Deletion processed", body = MessageResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(operation = "cascade_delete"))]
pub async fn delete_media(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<DeleteMediaRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let urls = request.into_urls();

    let report = state.gateway.cascade_delete(&urls).await;

    Ok(Json(MessageResponse {
        message: format!(
            "Processed {} media URL(s): {} deleted, {} failed, {} skipped",
            urls.len(),
            report.deleted,
            report.failed,
            report.skipped
        ),
    }))
}
