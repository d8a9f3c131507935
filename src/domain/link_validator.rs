//! Link validation contract used by the batch scheduler.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::check_outcome::CheckOutcome;
use crate::domain::entities::Link;

/// Checks the liveness of a single link.
///
/// Implementations are stateless with respect to the run: they never touch
/// storage and never fail. Every transport or HTTP problem is folded into the
/// returned [`CheckOutcome`], so one bad link can never abort a batch.
///
/// `cancel` is the run's stop signal. Implementations may use it to skip
/// optional follow-up work, but in-flight requests are allowed to finish.
///
/// # Implementations
///
/// - [`crate::infrastructure::http::HttpLinkValidator`] - reqwest-backed HEAD/GET probe
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkValidator: Send + Sync {
    async fn validate(&self, link: &Link, cancel: &CancellationToken) -> CheckOutcome;
}
