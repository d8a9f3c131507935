//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{ComponentStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: Database unreachable
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "checks": {
///     "database": { "status": "ok", "message": "Connected, 120 links" },
///     "checker": { "status": "ok", "message": "Idle" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let database = check_database(&state).await;
    let checker = check_checker(&state);

    let all_healthy = database.is_ok() && checker.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks { database, checker },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

async fn check_database(state: &AppState) -> ComponentStatus {
    match state.check_controller.link_count().await {
        Ok(count) => ComponentStatus::ok(format!("Connected, {count} links")),
        Err(e) => ComponentStatus::error(format!("Database error: {e}")),
    }
}

fn check_checker(state: &AppState) -> ComponentStatus {
    let status = state.check_controller.status();

    match status.run_id {
        Some(run_id) if status.is_running => ComponentStatus::ok(format!(
            "Run {run_id} in progress: {}/{} ({}%)",
            status.processed, status.total, status.percent
        )),
        _ => ComponentStatus::ok("Idle"),
    }
}
