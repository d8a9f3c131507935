//! Read-only status snapshots of the current or last check run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::entities::{CheckRun, RunState};

/// Snapshot returned by [`crate::application::services::CheckController::status`].
///
/// `run_id` identifies which persisted results belong to the reported run.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CheckStatus {
    pub is_running: bool,
    pub state: RunState,
    pub run_id: Option<Uuid>,
    pub total: usize,
    pub processed: usize,
    pub valid: usize,
    pub invalid: usize,
    pub percent: u32,
    pub elapsed_seconds: u64,
    pub elapsed: String,
    pub estimated_remaining_seconds: Option<u64>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl CheckStatus {
    /// Status when no run has been started yet.
    pub fn idle() -> Self {
        Self {
            is_running: false,
            state: RunState::Idle,
            run_id: None,
            total: 0,
            processed: 0,
            valid: 0,
            invalid: 0,
            percent: 0,
            elapsed_seconds: 0,
            elapsed: format_elapsed(Duration::ZERO),
            estimated_remaining_seconds: None,
            started_at: None,
            finished_at: None,
        }
    }

    pub fn from_run(run: &CheckRun) -> Self {
        let progress = run.progress().snapshot();
        let elapsed = run.elapsed();
        let is_running = run.is_running();

        let estimated_remaining_seconds = if is_running {
            estimate_remaining(elapsed, progress.processed, run.total()).map(|d| d.as_secs())
        } else {
            None
        };

        Self {
            is_running,
            state: run.state(),
            run_id: Some(run.id()),
            total: run.total(),
            processed: progress.processed,
            valid: progress.valid,
            invalid: progress.invalid,
            percent: progress_percent(progress.processed, run.total()),
            elapsed_seconds: elapsed.as_secs(),
            elapsed: format_elapsed(elapsed),
            estimated_remaining_seconds,
            started_at: Some(run.started_at()),
            finished_at: run.finished_at(),
        }
    }
}

/// Whole-number completion percentage, rounded down. Zero for an empty run.
pub fn progress_percent(processed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let percent = (processed.min(total) as u128 * 100) / total as u128;
    percent as u32
}

/// Formats a duration as `45s`, `2m31s` or `1h02m03s`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);

    if hours > 0 {
        format!("{hours}h{minutes:02}m{seconds:02}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}

/// Projects the time left from the rate observed so far.
///
/// Returns `None` until at least one link has been processed.
pub fn estimate_remaining(elapsed: Duration, processed: usize, total: usize) -> Option<Duration> {
    if processed == 0 {
        return None;
    }
    let remaining = total.saturating_sub(processed) as u32;
    Some(elapsed.mul_f64(f64::from(remaining) / processed as f64))
}
