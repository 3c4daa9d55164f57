//! Health check handlers.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

/// Run an async check with timeout; returns "ready", "timeout", or "{prefix}: {error}".
async fn run_check<F, E>(timeout: Duration, f: F, error_prefix: &str) -> String
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    match tokio::time::timeout(timeout, f).await {
        Ok(Ok(())) => "ready".to_string(),
        Ok(Err(e)) => format!("{}: {}", error_prefix, e),
        Err(_) => "timeout".to_string(),
    }
}

#[derive(serde::Serialize)]
pub(super) struct ReadinessResponse {
    pub status: String,
    pub backend: String,
    pub storage: String,
}

/// Liveness probe - process is running.
pub async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "alive" })),
    )
}

/// Readiness probe
///
/// The local backend must still have its root directory. Remote backends are
/// reported as configured without a network round trip.
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let storage = match &state.local {
        Some(local) => {
            let root = local.base_path().to_path_buf();
            run_check(
                TIMEOUT,
                async move {
                    let meta = tokio::fs::metadata(&root).await?;
                    if meta.is_dir() {
                        Ok(())
                    } else {
                        Err(std::io::Error::new(
                            std::io::ErrorKind::NotFound,
                            "storage root is not a directory",
                        ))
                    }
                },
                "not_ready",
            )
            .await
        }
        None => "configured".to_string(),
    };

    let ready = storage == "ready" || storage == "configured";
    if !ready {
        tracing::error!(storage = %storage, "Storage readiness check failed");
    }

    let response = ReadinessResponse {
        status: if ready { "ready" } else { "not_ready" }.to_string(),
        backend: state.backend().to_string(),
        storage,
    };

    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}
