//! Check run entity: one detection campaign over the link snapshot.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Life cycle state of a run as reported to callers.
///
/// `StopRequested` is a sub-state of running: the run keeps draining
/// already-dispatched work until it reaches `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Running,
    StopRequested,
    Completed,
}

/// Aggregate counters of a run.
///
/// Only the result collector writes these; status readers take snapshots
/// without locking.
#[derive(Debug, Default)]
pub struct RunProgress {
    processed: AtomicUsize,
    valid: AtomicUsize,
    invalid: AtomicUsize,
}

/// Point-in-time copy of [`RunProgress`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub processed: usize,
    pub valid: usize,
    pub invalid: usize,
}

impl RunProgress {
    /// Counts one outcome and returns the new `processed` value.
    pub(crate) fn record(&self, is_valid: bool) -> usize {
        if is_valid {
            self.valid.fetch_add(1, Ordering::SeqCst);
        } else {
            self.invalid.fetch_add(1, Ordering::SeqCst);
        }
        self.processed.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            processed: self.processed.load(Ordering::SeqCst),
            valid: self.valid.load(Ordering::SeqCst),
            invalid: self.invalid.load(Ordering::SeqCst),
        }
    }
}

/// A single check run.
///
/// Shared between the controller (status, stop), the scheduler (cancellation,
/// progress reporting) and the collector (counters, completion).
#[derive(Debug)]
pub struct CheckRun {
    id: Uuid,
    total: usize,
    started_at: DateTime<Utc>,
    progress: RunProgress,
    cancel: CancellationToken,
    finished_at: OnceLock<DateTime<Utc>>,
}

impl CheckRun {
    /// Creates a running check over `total` links with a fresh identifier.
    pub fn start(total: usize) -> Self {
        Self::with_id(Uuid::new_v4(), total, Utc::now())
    }

    pub fn with_id(id: Uuid, total: usize, started_at: DateTime<Utc>) -> Self {
        Self {
            id,
            total,
            started_at,
            progress: RunProgress::default(),
            cancel: CancellationToken::new(),
            finished_at: OnceLock::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at.get().copied()
    }

    pub fn progress(&self) -> &RunProgress {
        &self.progress
    }

    /// Token observed by the scheduler and validators of this run.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_running(&self) -> bool {
        self.finished_at.get().is_none()
    }

    pub fn is_stop_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn state(&self) -> RunState {
        if !self.is_running() {
            RunState::Completed
        } else if self.is_stop_requested() {
            RunState::StopRequested
        } else {
            RunState::Running
        }
    }

    /// Requests cooperative cancellation.
    ///
    /// Returns `false` when the run has already completed.
    pub fn request_stop(&self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.cancel.cancel();
        true
    }

    /// Marks the run as completed. Later calls keep the first end time.
    pub(crate) fn finish(&self, at: DateTime<Utc>) {
        let _ = self.finished_at.set(at);
    }

    /// Wall-clock time since start, frozen at the end time once completed.
    pub fn elapsed(&self) -> Duration {
        let end = self.finished_at().unwrap_or_else(Utc::now);
        (end - self.started_at).to_std().unwrap_or_default()
    }
}
