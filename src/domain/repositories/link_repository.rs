//! Repository trait for the external link registry.

use crate::domain::entities::Link;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Narrow read/write contract onto the bookmark registry.
///
/// The checker reads the full link set once per run and writes back the cached
/// validity of each link once it has been checked. Nothing else on a link is
/// ever touched.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Lists every stored link, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list_links(&self) -> Result<Vec<Link>, AppError>;

    /// Counts stored links.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn count_links(&self) -> Result<i64, AppError>;

    /// Stores the latest validity flag and check time on a link.
    ///
    /// Returns `Ok(false)` when the link no longer exists.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn update_validity(
        &self,
        link_id: i64,
        is_valid: bool,
        checked_at: DateTime<Utc>,
    ) -> Result<bool, AppError>;
}
