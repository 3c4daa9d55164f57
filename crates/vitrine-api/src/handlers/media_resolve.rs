use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use crate::validation::validate_batch;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use vitrine_core::models::{ResolveBatchRequest, ResolveQuery, ResolvedUrl};

/// Resolve one stored canonical URL to the URL the client should load
#[utoipa::path(
    get,
    path = "/api/v0/media/resolve",
    tag = "media",
    params(ResolveQuery),
    responses(
        (status = 200, description = "Resolved URL", body = ResolvedUrl)
    )
)]
#[tracing::instrument(skip(state, query), fields(operation = "resolve_read_url"))]
pub async fn resolve_media_url(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ResolveQuery>,
) -> impl IntoResponse {
    let signed_url = state.gateway.resolve_read_url(&query.url).await;

    Json(ResolvedUrl {
        original_url: query.url,
        signed_url,
        error: None,
    })
}

/// Resolve a batch of canonical URLs
///
/// Entries are returned in request order. A URL that fails to sign comes
/// back unchanged with `error` set.
#[utoipa::path(
    post,
    path = "/api/v0/media/resolve",
    tag = "media",
    request_body = ResolveBatchRequest,
    responses(
        (status = 200, description = "Resolved URLs", body = Vec<ResolvedUrl>),
        (status = 400, description = "Invalid input", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, request),
    fields(count = request.canonical_urls.len(), operation = "resolve_read_urls")
)]
pub async fn resolve_media_urls(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<ResolveBatchRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    validate_batch(&request.canonical_urls)?;

    let resolved = state.gateway.resolve_read_urls(request.canonical_urls).await;

    Ok(Json(resolved))
}
