//! Outcome model carried from validators to the result collector.

use chrono::{DateTime, Utc};
use std::time::Duration;
use uuid::Uuid;

use crate::domain::entities::{ErrorKind, Link, NewCheckResult, Verdict};

/// The result of validating one link, before it is persisted.
///
/// Produced by a [`crate::domain::link_validator::LinkValidator`] and sent
/// through the result channel. Exactly one outcome exists per checked link.
///
/// # Usage Flow
///
/// 1. Created by the validator after the network check (or without one for
///    links that lack an HTTP scheme)
/// 2. Sent to the result channel as [`CollectorEvent::Outcome`]
/// 3. Consumed by [`crate::domain::result_collector::run_result_collector`]
/// 4. Converted to [`NewCheckResult`] for persistence
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    pub link_id: i64,
    pub url: String,
    pub verdict: Verdict,
    pub status_code: Option<u16>,
    pub latency: Duration,
}

impl CheckOutcome {
    /// Creates an outcome for a link that answered with `status`.
    pub fn from_status(link: &Link, status: u16, latency: Duration) -> Self {
        let verdict = match ErrorKind::from_status(status) {
            None => Verdict::Valid,
            Some(kind) => Verdict::invalid(kind),
        };

        Self {
            link_id: link.id,
            url: link.url.clone(),
            verdict,
            status_code: Some(status),
            latency,
        }
    }

    /// Creates an outcome for a link whose request never produced a status.
    pub fn failed(link: &Link, kind: ErrorKind, message: String, latency: Duration) -> Self {
        Self {
            link_id: link.id,
            url: link.url.clone(),
            verdict: Verdict::Invalid { kind, message },
            status_code: None,
            latency,
        }
    }

    /// Creates the outcome for a link without an `http`/`https` scheme.
    pub fn invalid_url(link: &Link) -> Self {
        Self {
            link_id: link.id,
            url: link.url.clone(),
            verdict: Verdict::invalid(ErrorKind::InvalidUrl),
            status_code: None,
            latency: Duration::ZERO,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.verdict.is_valid()
    }

    /// Tags the outcome with its run for persistence.
    pub fn into_new_result(self, run_id: Uuid, checked_at: DateTime<Utc>) -> NewCheckResult {
        NewCheckResult {
            run_id,
            link_id: self.link_id,
            url: self.url,
            verdict: self.verdict,
            status_code: self.status_code,
            latency_ms: i64::try_from(self.latency.as_millis()).unwrap_or(i64::MAX),
            checked_at,
        }
    }
}

/// What the scheduler dispatched before it signalled completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub batches: usize,
    pub dispatched: usize,
    pub cancelled: bool,
}

/// Messages flowing through the result channel.
#[derive(Debug, Clone)]
pub enum CollectorEvent {
    Outcome(CheckOutcome),
    /// Sent once by the scheduler after its last batch has drained.
    Finished(DispatchSummary),
}
