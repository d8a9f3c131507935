mod common;

use async_trait::async_trait;
use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use axum_test::TestServer;
use chrono::Utc;
use deadlink_checker::api::handlers::health_handler;
use deadlink_checker::api::routes::check_routes;
use deadlink_checker::domain::check_outcome::CheckOutcome;
use deadlink_checker::domain::entities::{CheckResult, ErrorKind, Link};
use deadlink_checker::domain::link_validator::LinkValidator;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

struct GateValidator;

#[async_trait]
impl LinkValidator for GateValidator {
    async fn validate(&self, link: &Link, cancel: &CancellationToken) -> CheckOutcome {
        cancel.cancelled().await;
        CheckOutcome::from_status(link, 200, Duration::ZERO)
    }
}

struct InstantValidator;

#[async_trait]
impl LinkValidator for InstantValidator {
    async fn validate(&self, link: &Link, _cancel: &CancellationToken) -> CheckOutcome {
        CheckOutcome::from_status(link, 200, Duration::ZERO)
    }
}

fn test_server(checker: &common::TestChecker) -> TestServer {
    let app = Router::new()
        .route("/health", get(health_handler))
        .nest("/api", check_routes())
        .with_state(common::create_test_state(checker));

    TestServer::new(app).unwrap()
}

fn stored_result(run_id: Uuid, link_id: i64, kind: Option<ErrorKind>) -> CheckResult {
    CheckResult {
        id: link_id,
        run_id,
        link_id,
        url: format!("https://site{link_id}.test/"),
        is_valid: kind.is_none(),
        status_code: match kind {
            Some(ErrorKind::Http(code)) => Some(code),
            Some(_) => None,
            None => Some(200),
        },
        error_message: kind.map(|k| k.default_message()),
        error_kind: kind,
        latency_ms: 12,
        checked_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_start_check_returns_accepted_with_run_id() {
    let checker = common::create_test_checker(
        common::sample_links(3),
        Arc::new(InstantValidator),
        common::fast_settings(),
    );
    let server = test_server(&checker);

    let response = server.post("/api/checks").await;

    response.assert_status(StatusCode::ACCEPTED);
    let json = response.json::<Value>();
    let run_id: Uuid = json["run_id"].as_str().unwrap().parse().unwrap();

    common::wait_until_idle(&checker.controller, Duration::from_secs(5)).await;

    let status = server.get("/api/checks/status").await;
    status.assert_status_ok();
    let json = status.json::<Value>();
    assert_eq!(json["run_id"], run_id.to_string());
    assert_eq!(json["state"], "completed");
    assert_eq!(json["is_running"], false);
    assert_eq!(json["processed"], 3);
    assert_eq!(json["percent"], 100);
}

#[tokio::test]
async fn test_start_while_running_conflicts() {
    let checker = common::create_test_checker(
        common::sample_links(2),
        Arc::new(GateValidator),
        common::fast_settings(),
    );
    let server = test_server(&checker);

    let first = server.post("/api/checks").await.json::<Value>();
    let response = server.post("/api/checks").await;

    response.assert_status(StatusCode::CONFLICT);
    let json = response.json::<Value>();
    assert_eq!(json["error"]["code"], "conflict");
    assert_eq!(json["error"]["details"]["run_id"], first["run_id"]);

    checker.controller.stop();
    common::wait_until_idle(&checker.controller, Duration::from_secs(5)).await;
}

#[tokio::test]
async fn test_status_before_any_run_is_idle() {
    let checker = common::create_test_checker(
        Vec::new(),
        Arc::new(InstantValidator),
        common::fast_settings(),
    );
    let server = test_server(&checker);

    let response = server.get("/api/checks/status").await;

    response.assert_status_ok();
    let json = response.json::<Value>();
    assert_eq!(json["state"], "idle");
    assert_eq!(json["is_running"], false);
    assert!(json["run_id"].is_null());
    assert_eq!(json["elapsed"], "0s");
}

#[tokio::test]
async fn test_stop_without_run_reports_not_stopped() {
    let checker = common::create_test_checker(
        Vec::new(),
        Arc::new(InstantValidator),
        common::fast_settings(),
    );
    let server = test_server(&checker);

    let response = server.post("/api/checks/stop").await;

    response.assert_status_ok();
    let json = response.json::<Value>();
    assert_eq!(json["stopped"], false);
    assert!(json.get("run_id").is_none());
}

#[tokio::test]
async fn test_stop_signals_active_run() {
    let checker = common::create_test_checker(
        common::sample_links(2),
        Arc::new(GateValidator),
        common::fast_settings(),
    );
    let server = test_server(&checker);

    let started = server.post("/api/checks").await.json::<Value>();
    let response = server.post("/api/checks/stop").await;

    response.assert_status_ok();
    let json = response.json::<Value>();
    assert_eq!(json["stopped"], true);
    assert_eq!(json["run_id"], started["run_id"]);

    common::wait_until_idle(&checker.controller, Duration::from_secs(5)).await;
    let status = server.get("/api/checks/status").await.json::<Value>();
    assert_eq!(status["state"], "completed");
}

#[tokio::test]
async fn test_results_can_be_filtered_to_invalid() {
    let checker = common::create_test_checker(
        Vec::new(),
        Arc::new(InstantValidator),
        common::fast_settings(),
    );
    let run_id = Uuid::new_v4();
    checker.results.insert(stored_result(run_id, 1, None));
    checker
        .results
        .insert(stored_result(run_id, 2, Some(ErrorKind::Http(404))));
    checker
        .results
        .insert(stored_result(run_id, 3, Some(ErrorKind::Timeout)));
    checker
        .results
        .insert(stored_result(Uuid::new_v4(), 4, Some(ErrorKind::Timeout)));
    let server = test_server(&checker);

    let all = server
        .get(&format!("/api/checks/{run_id}/results"))
        .await
        .json::<Value>();
    assert_eq!(all["total"], 3);
    assert_eq!(all["invalid_only"], false);

    let response = server
        .get(&format!("/api/checks/{run_id}/results"))
        .add_query_param("invalid_only", true)
        .await;

    response.assert_status_ok();
    let json = response.json::<Value>();
    assert_eq!(json["total"], 2);
    let items = json["items"].as_array().unwrap();
    assert_eq!(items[0]["error_kind"], "http_404");
    assert_eq!(items[0]["status_code"], 404);
    assert_eq!(items[1]["error_kind"], "timeout");
    assert!(items[1].get("status_code").is_none());
}

#[tokio::test]
async fn test_results_reject_malformed_run_id() {
    let checker = common::create_test_checker(
        Vec::new(),
        Arc::new(InstantValidator),
        common::fast_settings(),
    );
    let server = test_server(&checker);

    let response = server.get("/api/checks/not-a-uuid/results").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let json = response.json::<Value>();
    assert_eq!(json["error"]["code"], "validation_error");
    assert_eq!(json["error"]["message"], "Invalid path parameter");
    assert!(json["error"]["details"]["reason"].is_string());
}

#[tokio::test]
async fn test_results_reject_non_boolean_filter() {
    let checker = common::create_test_checker(
        Vec::new(),
        Arc::new(InstantValidator),
        common::fast_settings(),
    );
    let server = test_server(&checker);

    let response = server
        .get(&format!("/api/checks/{}/results", Uuid::new_v4()))
        .add_query_param("invalid_only", "maybe")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let json = response.json::<Value>();
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn test_health_reports_database_and_checker() {
    let checker = common::create_test_checker(
        common::sample_links(3),
        Arc::new(InstantValidator),
        common::fast_settings(),
    );
    let server = test_server(&checker);

    let response = server.get("/health").await;

    response.assert_status_ok();
    let json = response.json::<Value>();
    assert_eq!(json["status"], "healthy");
    assert!(json.get("version").is_some());
    assert_eq!(json["checks"]["database"]["status"], "ok");
    assert_eq!(
        json["checks"]["database"]["message"],
        "Connected, 3 links"
    );
    assert_eq!(json["checks"]["checker"]["message"], "Idle");
}
