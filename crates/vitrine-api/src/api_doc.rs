//! OpenAPI documentation.
//! API version is in `crate::constants::API_VERSION`.
//! Handler annotations use the /api/v0 placeholder; paths are rewritten when served.

use utoipa::OpenApi;

use crate::constants::API_VERSION;
use crate::error;
use crate::handlers;
use vitrine_core::models;

/// Placeholder version used in handler path annotations (utoipa requires compile-time literals).
const OPENAPI_PATH_PLACEHOLDER: &str = "/api/v0";

fn transform_openapi_paths(spec: &mut utoipa::openapi::OpenApi, version: &str) {
    let replacement = format!("/api/{}", version);
    if OPENAPI_PATH_PLACEHOLDER == replacement {
        return;
    }
    let path_map = std::mem::take(&mut spec.paths.paths);
    for (key, item) in path_map {
        let new_key = key.replacen(OPENAPI_PATH_PLACEHOLDER, &replacement, 1);
        spec.paths.paths.insert(new_key, item);
    }
}

/// Returns the OpenAPI spec with path placeholders replaced by the current API version.
pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    let mut spec = ApiDoc::openapi();
    transform_openapi_paths(&mut spec, API_VERSION);
    spec
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vitrine Media Gateway",
        version = "0.1.0",
        description = "Upload negotiation, read URL resolution and deletion for design images and videos. \
            Callers persist canonical URLs; the gateway turns them into loadable URLs on read. \
            All endpoints are versioned under /api/v0/."
    ),
    paths(
        handlers::uploads::request_upload,
        handlers::local_ingest::ingest_local,
        handlers::media_resolve::resolve_media_url,
        handlers::media_resolve::resolve_media_urls,
        handlers::media_delete::delete_media,
    ),
    components(
        schemas(
            models::UploadRequest,
            models::UploadTarget,
            models::UploadResponse,
            models::DeleteMediaRequest,
            models::ResolveBatchRequest,
            models::ResolvedUrl,
            models::MessageResponse,
            models::LocalIngestResponse,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "uploads", description = "Upload negotiation and local ingestion"),
        (name = "media", description = "Read URL resolution and deletion of stored media"),
    )
)]
pub struct ApiDoc;
