//! PostgreSQL implementation of the check result store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::{CheckResult, ErrorKind, NewCheckResult};
use crate::domain::repositories::{CheckResultRepository, ResultFilter};
use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct CheckResultRow {
    id: i64,
    run_id: Uuid,
    link_id: i64,
    url: String,
    is_valid: bool,
    status_code: Option<i32>,
    error_kind: Option<String>,
    error_message: Option<String>,
    latency_ms: i64,
    checked_at: DateTime<Utc>,
}

impl From<CheckResultRow> for CheckResult {
    fn from(row: CheckResultRow) -> Self {
        let error_kind = row.error_kind.map(|kind| {
            kind.parse().unwrap_or_else(|e| {
                tracing::warn!(result_id = row.id, error = %e, "Unrecognized stored error kind");
                ErrorKind::UnknownError
            })
        });

        Self {
            id: row.id,
            run_id: row.run_id,
            link_id: row.link_id,
            url: row.url,
            is_valid: row.is_valid,
            status_code: row.status_code.and_then(|code| u16::try_from(code).ok()),
            error_kind,
            error_message: row.error_message,
            latency_ms: row.latency_ms,
            checked_at: row.checked_at,
        }
    }
}

/// PostgreSQL repository over the `check_results` table.
pub struct PgCheckResultRepository {
    pool: Arc<PgPool>,
}

impl PgCheckResultRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CheckResultRepository for PgCheckResultRepository {
    async fn append_result(&self, result: NewCheckResult) -> Result<CheckResult, AppError> {
        let row = sqlx::query_as::<_, CheckResultRow>(
            r#"
            INSERT INTO check_results
                (run_id, link_id, url, is_valid, status_code, error_kind, error_message,
                 latency_ms, checked_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, run_id, link_id, url, is_valid, status_code, error_kind,
                      error_message, latency_ms, checked_at
            "#,
        )
        .bind(result.run_id)
        .bind(result.link_id)
        .bind(&result.url)
        .bind(result.verdict.is_valid())
        .bind(result.status_code.map(i32::from))
        .bind(result.verdict.error_kind().map(|kind| kind.to_string()))
        .bind(result.verdict.error_message())
        .bind(result.latency_ms)
        .bind(result.checked_at)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn query_results(
        &self,
        run_id: Uuid,
        filter: ResultFilter,
    ) -> Result<Vec<CheckResult>, AppError> {
        let rows = sqlx::query_as::<_, CheckResultRow>(
            r#"
            SELECT id, run_id, link_id, url, is_valid, status_code, error_kind,
                   error_message, latency_ms, checked_at
            FROM check_results
            WHERE run_id = $1 AND ($2 = FALSE OR is_valid = FALSE)
            ORDER BY checked_at, id
            "#,
        )
        .bind(run_id)
        .bind(filter.only_invalid)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(CheckResult::from).collect())
    }

    async fn clear_results(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM check_results")
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected())
    }
}
