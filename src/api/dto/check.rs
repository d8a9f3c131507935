//! DTOs for check run endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::CheckResult;

/// Response for `POST /api/checks`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StartCheckResponse {
    pub run_id: Uuid,
    pub message: String,
}

/// Response for `POST /api/checks/stop`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StopCheckResponse {
    pub stopped: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,

    pub message: String,
}

/// Query parameters for `GET /api/checks/{run_id}/results`.
#[derive(Debug, Default, Deserialize)]
pub struct ResultsQuery {
    /// Only return links judged invalid.
    #[serde(default)]
    pub invalid_only: bool,
}

/// One checked link.
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckResultItem {
    pub link_id: i64,
    pub url: String,
    pub is_valid: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    pub latency_ms: i64,
    pub checked_at: DateTime<Utc>,
}

impl From<CheckResult> for CheckResultItem {
    fn from(result: CheckResult) -> Self {
        Self {
            link_id: result.link_id,
            url: result.url,
            is_valid: result.is_valid,
            status_code: result.status_code,
            error_kind: result.error_kind.map(|kind| kind.to_string()),
            error_message: result.error_message,
            latency_ms: result.latency_ms,
            checked_at: result.checked_at,
        }
    }
}

/// Response for `GET /api/checks/{run_id}/results`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckResultsResponse {
    pub run_id: Uuid,
    pub total: usize,
    pub invalid_only: bool,
    pub items: Vec<CheckResultItem>,
}
