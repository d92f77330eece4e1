//! Health check endpoints for Kubernetes probes and monitoring.

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use http::StatusCode;
use serde::Serialize;

use crate::AppState;

/// Detailed health status response.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    /// Overall status: "healthy" or "unhealthy"
    pub status: &'static str,
    /// Service version
    pub version: &'static str,
    /// Individual subsystem statuses
    pub subsystems: SubsystemStatus,
}

/// Status of individual subsystems.
#[derive(Debug, Serialize)]
pub struct SubsystemStatus {
    /// Record store status
    pub database: ComponentStatus,
}

/// Status of a single component.
#[derive(Debug, Serialize)]
pub struct ComponentStatus {
    pub healthy: bool,
    /// Backend name (`memory`, `sqlite`, `postgres`) when one is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness))
        .route("/health/ready", get(readiness))
}

async fn check_database(state: &AppState) -> ComponentStatus {
    let Some(db) = &state.db else {
        return ComponentStatus {
            healthy: false,
            backend: None,
            message: Some("No record store configured".to_string()),
            latency_ms: None,
        };
    };

    let start = std::time::Instant::now();
    let result = db.health_check().await;
    let latency_ms = start.elapsed().as_millis() as u64;

    if let Err(e) = &result {
        tracing::warn!(backend = db.backend(), error = %e, "Record store health check failed");
    }

    ComponentStatus {
        healthy: result.is_ok(),
        backend: Some(db.backend()),
        message: result
            .err()
            .map(|_| "Database connection failed".to_string()),
        latency_ms: Some(latency_ms),
    }
}

/// Full health check with subsystem status.
///
/// The service has nothing to answer with when the record store is missing
/// or unreachable, so either makes it unhealthy.
#[tracing::instrument(name = "health.check", skip(state))]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = check_database(&state).await;
    let healthy = database.healthy;

    let status = HealthStatus {
        status: if healthy { "healthy" } else { "unhealthy" },
        version: env!("CARGO_PKG_VERSION"),
        subsystems: SubsystemStatus { database },
    };

    let code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(status))
}

/// Liveness probe. Returns 200 while the process can serve requests at all.
#[tracing::instrument(name = "health.liveness")]
pub async fn liveness() -> impl IntoResponse {
    StatusCode::OK
}

/// Readiness probe. Returns 200 only when the record store answers.
#[tracing::instrument(name = "health.readiness", skip(state))]
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if check_database(&state).await.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
