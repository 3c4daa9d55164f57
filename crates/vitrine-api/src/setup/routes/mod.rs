//! Route configuration and setup.

mod health;

use crate::constants::{API_PREFIX, LOCAL_MEDIA_PATH};
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{delete, get, post},
    Json, Router,
};
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use vitrine_core::Config;
use vitrine_infra::request_id_middleware;

/// Room for multipart boundaries and the `key` field on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    let http_concurrency_limit = config.http_concurrency_limit().max(1);
    tracing::info!(
        http_concurrency_limit = http_concurrency_limit,
        "HTTP concurrency limit layer enabled"
    );

    let max_body = config.max_upload_size_bytes() + MULTIPART_OVERHEAD_BYTES;

    let mut app = Router::new()
        .merge(health_routes())
        .nest(API_PREFIX, api_routes(&state, max_body))
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        )
        .merge(utoipa_rapidoc::RapiDoc::new("/api/openapi.json").path("/docs"));

    if let Some(local) = &state.local {
        tracing::info!(
            path = %local.base_path().display(),
            mount = LOCAL_MEDIA_PATH,
            "Serving local media files"
        );
        app = app.nest_service(LOCAL_MEDIA_PATH, ServeDir::new(local.base_path()));
    }

    let app = app
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(max_body))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state);

    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers(Any)
    };
    Ok(cors)
}

fn health_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::liveness_check))
        .route("/health/ready", get(health::readiness_check))
}

fn api_routes(state: &Arc<AppState>, max_body: usize) -> Router<Arc<AppState>> {
    let mut router = Router::new()
        .route("/uploads", post(handlers::uploads::request_upload))
        .route("/media", delete(handlers::media_delete::delete_media))
        .route(
            "/media/resolve",
            get(handlers::media_resolve::resolve_media_url)
                .post(handlers::media_resolve::resolve_media_urls),
        );

    // Only the local backend receives bytes through this process.
    if state.local.is_some() {
        router = router.route(
            "/uploads/local",
            post(handlers::local_ingest::ingest_local).layer(DefaultBodyLimit::max(max_body)),
        );
    }

    router
}
