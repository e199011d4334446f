//! Probes served by the HTTP layer itself rather than by a module.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use bookshelf_kernel::{HealthReport, HealthStatus, ModuleRegistry};

/// Router exposing `/api/health` over the registered modules.
pub fn router(registry: &ModuleRegistry) -> Router {
    Router::new()
        .route("/api/health", get(api_health))
        .with_state(Arc::new(registry.clone()))
}

/// Liveness endpoint
pub async fn liveness() -> &'static str {
    "ok"
}

/// Only `Unhealthy` turns into 503; a `Degraded` report still answers 200.
async fn api_health(
    State(registry): State<Arc<ModuleRegistry>>,
) -> (StatusCode, Json<HealthReport>) {
    let report = HealthReport::from_checks(registry.health_checks().await);
    let status = match report.status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
    };

    if status != StatusCode::OK {
        tracing::warn!(checks = ?report.checks, "health probe reports unhealthy dependencies");
    }

    (status, Json(report))
}
