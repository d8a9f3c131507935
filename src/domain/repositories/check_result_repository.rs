//! Repository trait for persisted check results.

use crate::domain::entities::{CheckResult, NewCheckResult};
use crate::error::AppError;
use async_trait::async_trait;
use uuid::Uuid;

/// Filter criteria for result queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultFilter {
    pub only_invalid: bool,
}

impl ResultFilter {
    /// Creates a filter returning every result of a run.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restricts the query to invalid links.
    pub fn invalid_only(mut self, only_invalid: bool) -> Self {
        self.only_invalid = only_invalid;
        self
    }
}

/// Repository interface for check results.
///
/// Written exclusively by the result collector; read by reporting callers.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgCheckResultRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CheckResultRepository: Send + Sync {
    /// Appends one result row tagged with its run.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn append_result(&self, result: NewCheckResult) -> Result<CheckResult, AppError>;

    /// Returns the results recorded for a run, ordered by check time.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn query_results(
        &self,
        run_id: Uuid,
        filter: ResultFilter,
    ) -> Result<Vec<CheckResult>, AppError>;

    /// Deletes every stored result and returns the number of removed rows.
    ///
    /// Called when a fresh run starts so only the live run stays visible.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn clear_results(&self) -> Result<u64, AppError>;
}
