use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use energy_community::error::AppError;
use energy_community::snapshot::IngestionReport;
use energy_community::{eligibility_router, EligibilityService};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_service_routes(service: Arc<EligibilityService>) -> Router {
    eligibility_router(service)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/admin/reload", post(reload_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.is_ready();
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let generation = state.snapshots.current().generation();
    let payload = if ready {
        json!({ "status": "ready", "generation": generation })
    } else {
        json!({ "status": "loading", "generation": generation })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Rereads the data directory off the async runtime; 409 while another load runs.
pub(crate) async fn reload_endpoint(
    Extension(state): Extension<AppState>,
) -> Result<Json<IngestionReport>, AppError> {
    let report = tokio::task::spawn_blocking(move || state.reload())
        .await
        .map_err(|err| AppError::Io(std::io::Error::new(std::io::ErrorKind::Other, err)))??;
    Ok(Json(report))
}
