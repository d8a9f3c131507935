//! Handlers for check run endpoints.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    http::StatusCode,
};

use crate::api::dto::check::{
    CheckResultItem, CheckResultsResponse, ResultsQuery, StartCheckResponse, StopCheckResponse,
};
use crate::application::services::{CheckStatus, StopOutcome};
use crate::domain::repositories::ResultFilter;
use crate::error::AppError;
use crate::state::AppState;

/// Starts a new check run over every stored link.
///
/// # Endpoint
///
/// `POST /api/checks`
///
/// # Response Codes
///
/// - **202 Accepted**: Run started, validation continues in background
/// - **409 Conflict**: A run is already in progress (`details.run_id` names it)
/// - **500 Internal Server Error**: Link snapshot could not be loaded
pub async fn start_check_handler(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<StartCheckResponse>), AppError> {
    let run_id = state.check_controller.start().await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(StartCheckResponse {
            run_id,
            message: "Check run started".to_string(),
        }),
    ))
}

/// Reports progress of the active run, or of the last run.
///
/// # Endpoint
///
/// `GET /api/checks/status`
///
/// # Response
///
/// ```json
/// {
///   "is_running": true,
///   "state": "running",
///   "run_id": "5f0c...",
///   "total": 120,
///   "processed": 40,
///   "valid": 37,
///   "invalid": 3,
///   "percent": 33,
///   "elapsed_seconds": 12,
///   "elapsed": "12s",
///   "estimated_remaining_seconds": 24,
///   "started_at": "2025-01-01T12:00:00Z",
///   "finished_at": null
/// }
/// ```
pub async fn check_status_handler(State(state): State<AppState>) -> Json<CheckStatus> {
    Json(state.check_controller.status())
}

/// Requests a cooperative stop of the active run.
///
/// # Endpoint
///
/// `POST /api/checks/stop`
///
/// Always answers 200; `stopped` tells whether a run was signalled.
pub async fn stop_check_handler(State(state): State<AppState>) -> Json<StopCheckResponse> {
    let response = match state.check_controller.stop() {
        StopOutcome::Requested(run_id) => StopCheckResponse {
            stopped: true,
            run_id: Some(run_id),
            message: "Stop requested; in-flight checks will finish".to_string(),
        },
        StopOutcome::NotRunning => StopCheckResponse {
            stopped: false,
            run_id: None,
            message: "No check run in progress".to_string(),
        },
    };

    Json(response)
}

/// Lists results recorded for a run.
///
/// # Endpoint
///
/// `GET /api/checks/{run_id}/results`
///
/// # Query Parameters
///
/// - `invalid_only` (optional): Only return broken links (default: false)
///
/// # Errors
///
/// Returns 400 Bad Request with the usual error envelope if `run_id` is not a
/// UUID or `invalid_only` is not a boolean.
pub async fn check_results_handler(
    State(state): State<AppState>,
    run_id: Result<Path<uuid::Uuid>, PathRejection>,
    params: Result<Query<ResultsQuery>, QueryRejection>,
) -> Result<Json<CheckResultsResponse>, AppError> {
    let Path(run_id) = run_id?;
    let Query(params) = params?;
    let filter = ResultFilter::all().invalid_only(params.invalid_only);
    let results = state.check_controller.results(run_id, filter).await?;

    let items: Vec<CheckResultItem> = results.into_iter().map(CheckResultItem::from).collect();

    Ok(Json(CheckResultsResponse {
        run_id,
        total: items.len(),
        invalid_only: params.invalid_only,
        items,
    }))
}
