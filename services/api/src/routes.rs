use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use chrono::Utc;
use erights::router::ApiContext;
use serde_json::json;
use std::sync::Arc;

/// Compose the domain API router with the operational endpoints.
pub(crate) fn with_api_routes(ctx: Arc<ApiContext>) -> axum::Router {
    erights::router::api_router(ctx)
        .route("/api/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({
        "status": "OK",
        "message": "Rights Web App API is running",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
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

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body.get("status").and_then(|v| v.as_str()), Some("OK"));
        assert!(body.get("timestamp").is_some());
    }
}
