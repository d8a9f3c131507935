//! API route configuration.

use crate::api::handlers::{
    check_results_handler, check_status_handler, start_check_handler, stop_check_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Check run routes, nested under `/api`.
///
/// # Endpoints
///
/// - `POST /checks`                  - Start a run
/// - `GET  /checks/status`           - Progress of the active or last run
/// - `POST /checks/stop`             - Request a cooperative stop
/// - `GET  /checks/{run_id}/results` - Results of a run (`?invalid_only=true`)
pub fn check_routes() -> Router<AppState> {
    Router::new()
        .route("/checks", post(start_check_handler))
        .route("/checks/status", get(check_status_handler))
        .route("/checks/stop", post(stop_check_handler))
        .route("/checks/{run_id}/results", get(check_results_handler))
}
