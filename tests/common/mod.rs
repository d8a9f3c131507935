#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use chrono::{DateTime, Utc};
use deadlink_checker::application::services::{CheckController, CheckSettings};
use deadlink_checker::domain::entities::{CheckResult, Link, NewCheckResult};
use deadlink_checker::domain::link_validator::LinkValidator;
use deadlink_checker::domain::repositories::{CheckResultRepository, LinkRepository, ResultFilter};
use deadlink_checker::error::AppError;
use deadlink_checker::state::AppState;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

/// Link registry kept in memory.
#[derive(Default)]
pub struct InMemoryLinkRepository {
    links: Mutex<Vec<Link>>,
    validity: Mutex<HashMap<i64, (bool, DateTime<Utc>)>>,
}

impl InMemoryLinkRepository {
    pub fn with_links(links: Vec<Link>) -> Self {
        Self {
            links: Mutex::new(links),
            validity: Mutex::default(),
        }
    }

    pub fn validity(&self, link_id: i64) -> Option<bool> {
        self.validity
            .lock()
            .unwrap()
            .get(&link_id)
            .map(|(valid, _)| *valid)
    }

    pub fn validity_updates(&self) -> usize {
        self.validity.lock().unwrap().len()
    }
}

#[async_trait]
impl LinkRepository for InMemoryLinkRepository {
    async fn list_links(&self) -> Result<Vec<Link>, AppError> {
        Ok(self.links.lock().unwrap().clone())
    }

    async fn count_links(&self) -> Result<i64, AppError> {
        Ok(self.links.lock().unwrap().len() as i64)
    }

    async fn update_validity(
        &self,
        link_id: i64,
        is_valid: bool,
        checked_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let exists = self.links.lock().unwrap().iter().any(|l| l.id == link_id);
        if exists {
            self.validity
                .lock()
                .unwrap()
                .insert(link_id, (is_valid, checked_at));
        }
        Ok(exists)
    }
}

/// Result store kept in memory.
#[derive(Default)]
pub struct InMemoryCheckResultRepository {
    rows: Mutex<Vec<CheckResult>>,
}

impl InMemoryCheckResultRepository {
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn insert(&self, result: CheckResult) {
        self.rows.lock().unwrap().push(result);
    }
}

#[async_trait]
impl CheckResultRepository for InMemoryCheckResultRepository {
    async fn append_result(&self, result: NewCheckResult) -> Result<CheckResult, AppError> {
        let mut rows = self.rows.lock().unwrap();
        let stored = CheckResult {
            id: rows.len() as i64 + 1,
            run_id: result.run_id,
            link_id: result.link_id,
            is_valid: result.verdict.is_valid(),
            error_kind: result.verdict.error_kind(),
            error_message: result.verdict.error_message().map(str::to_string),
            url: result.url,
            status_code: result.status_code,
            latency_ms: result.latency_ms,
            checked_at: result.checked_at,
        };
        rows.push(stored.clone());
        Ok(stored)
    }

    async fn query_results(
        &self,
        run_id: Uuid,
        filter: ResultFilter,
    ) -> Result<Vec<CheckResult>, AppError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.run_id == run_id)
            .filter(|r| !filter.only_invalid || !r.is_valid)
            .cloned()
            .collect())
    }

    async fn clear_results(&self) -> Result<u64, AppError> {
        let mut rows = self.rows.lock().unwrap();
        let cleared = rows.len() as u64;
        rows.clear();
        Ok(cleared)
    }
}

/// Everything a controller-level test needs to inspect.
pub struct TestChecker {
    pub controller: Arc<CheckController>,
    pub links: Arc<InMemoryLinkRepository>,
    pub results: Arc<InMemoryCheckResultRepository>,
}

/// Settings with no pause and a short collector poll.
pub fn fast_settings() -> CheckSettings {
    CheckSettings {
        batch_size: 4,
        pool_size: 2,
        batch_pause: Duration::ZERO,
        collector_poll: Duration::from_millis(100),
        ..CheckSettings::default()
    }
}

pub fn create_test_checker(
    links: Vec<Link>,
    validator: Arc<dyn LinkValidator>,
    settings: CheckSettings,
) -> TestChecker {
    let links = Arc::new(InMemoryLinkRepository::with_links(links));
    let results = Arc::new(InMemoryCheckResultRepository::default());
    let controller = Arc::new(CheckController::new(
        links.clone(),
        results.clone(),
        validator,
        settings,
    ));

    TestChecker {
        controller,
        links,
        results,
    }
}

pub fn create_test_state(checker: &TestChecker) -> AppState {
    AppState::new(checker.controller.clone())
}

pub fn sample_links(count: i64) -> Vec<Link> {
    (1..=count)
        .map(|id| Link::new(id, format!("https://site{id}.test/")))
        .collect()
}

/// Serves `router` on an ephemeral local port.
pub async fn spawn_server(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    addr
}

/// Polls until the controller reports no running check.
pub async fn wait_until_idle(controller: &CheckController, limit: Duration) {
    tokio::time::timeout(limit, async {
        while controller.status().is_running {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("check run did not finish in time");
}

pub async fn insert_link(pool: &sqlx::PgPool, url: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO links (url) VALUES ($1) RETURNING id")
        .bind(url)
        .fetch_one(pool)
        .await
        .unwrap()
}
