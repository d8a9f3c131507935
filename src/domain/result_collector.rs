//! Single-writer consumer of the result channel.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::domain::check_outcome::{CheckOutcome, CollectorEvent};
use crate::domain::entities::{CheckRun, ProgressSnapshot};
use crate::domain::repositories::{CheckResultRepository, LinkRepository};

/// Drains check outcomes for one run until the run is complete.
///
/// This task is the only writer of the run counters, the result store and the
/// links' cached validity, so validators never contend on shared state.
///
/// The loop waits at most `poll_interval` per receive and finishes when:
/// - the scheduler sends [`CollectorEvent::Finished`]
/// - every snapshotted link has been processed
/// - all senders are gone
///
/// On exit the run is marked completed and the final counters are returned.
pub async fn run_result_collector(
    mut rx: mpsc::Receiver<CollectorEvent>,
    run: Arc<CheckRun>,
    link_repository: Arc<dyn LinkRepository>,
    result_repository: Arc<dyn CheckResultRepository>,
    poll_interval: Duration,
) -> ProgressSnapshot {
    loop {
        match tokio::time::timeout(poll_interval, rx.recv()).await {
            Ok(Some(CollectorEvent::Outcome(outcome))) => {
                let processed = record_outcome(
                    &run,
                    outcome,
                    link_repository.as_ref(),
                    result_repository.as_ref(),
                )
                .await;

                if processed >= run.total() {
                    debug!(run_id = %run.id(), processed, "All links processed");
                    break;
                }
            }
            Ok(Some(CollectorEvent::Finished(summary))) => {
                debug!(
                    run_id = %run.id(),
                    batches = summary.batches,
                    dispatched = summary.dispatched,
                    cancelled = summary.cancelled,
                    "Scheduler finished dispatching"
                );
                break;
            }
            Ok(None) => {
                warn!(run_id = %run.id(), "Result channel closed before completion marker");
                break;
            }
            Err(_) => {
                let progress = run.progress().snapshot();
                debug!(
                    run_id = %run.id(),
                    processed = progress.processed,
                    total = run.total(),
                    "Waiting for check outcomes"
                );
            }
        }
    }

    run.finish(Utc::now());
    metrics::counter!("deadlink_runs_completed_total").increment(1);

    let progress = run.progress().snapshot();
    info!(
        run_id = %run.id(),
        total = run.total(),
        processed = progress.processed,
        valid = progress.valid,
        invalid = progress.invalid,
        stopped = run.is_stop_requested(),
        elapsed_secs = run.elapsed().as_secs(),
        "Link check run completed"
    );

    progress
}

/// Counts and persists one outcome. Storage failures are logged and skipped.
async fn record_outcome(
    run: &CheckRun,
    outcome: CheckOutcome,
    link_repository: &dyn LinkRepository,
    result_repository: &dyn CheckResultRepository,
) -> usize {
    let is_valid = outcome.is_valid();
    let link_id = outcome.link_id;
    let checked_at = Utc::now();

    let processed = run.progress().record(is_valid);

    metrics::counter!(
        "deadlink_links_checked_total",
        "outcome" => if is_valid { "valid" } else { "invalid" }
    )
    .increment(1);
    metrics::histogram!("deadlink_check_latency_seconds").record(outcome.latency.as_secs_f64());

    if let Some(kind) = outcome.verdict.error_kind() {
        debug!(
            run_id = %run.id(),
            link_id,
            url = %outcome.url,
            error_kind = %kind,
            "Link is invalid"
        );
    }

    if let Err(e) = result_repository
        .append_result(outcome.into_new_result(run.id(), checked_at))
        .await
    {
        warn!(run_id = %run.id(), link_id, error = %e, "Failed to save check result");
    }

    match link_repository
        .update_validity(link_id, is_valid, checked_at)
        .await
    {
        Ok(true) => {}
        Ok(false) => debug!(link_id, "Link disappeared before its validity was stored"),
        Err(e) => warn!(link_id, error = %e, "Failed to update link validity"),
    }

    processed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::check_outcome::DispatchSummary;
    use crate::domain::entities::{CheckResult, ErrorKind, Link, NewCheckResult};
    use crate::domain::repositories::{MockCheckResultRepository, MockLinkRepository};
    use crate::error::AppError;
    use serde_json::json;

    const POLL: Duration = Duration::from_millis(50);

    fn stored(result: NewCheckResult) -> CheckResult {
        CheckResult {
            id: result.link_id,
            run_id: result.run_id,
            link_id: result.link_id,
            url: result.url,
            is_valid: result.verdict.is_valid(),
            status_code: result.status_code,
            error_kind: result.verdict.error_kind(),
            error_message: result.verdict.error_message().map(str::to_string),
            latency_ms: result.latency_ms,
            checked_at: result.checked_at,
        }
    }

    fn ok_outcome(id: i64) -> CollectorEvent {
        CollectorEvent::Outcome(CheckOutcome::from_status(
            &Link::new(id, format!("https://site{id}.test")),
            200,
            Duration::from_millis(10),
        ))
    }

    fn failed_outcome(id: i64) -> CollectorEvent {
        CollectorEvent::Outcome(CheckOutcome::from_status(
            &Link::new(id, format!("https://site{id}.test")),
            404,
            Duration::from_millis(10),
        ))
    }

    #[tokio::test]
    async fn test_collector_persists_every_outcome() {
        let run = Arc::new(CheckRun::start(3));
        let run_id = run.id();

        let mut results = MockCheckResultRepository::new();
        results
            .expect_append_result()
            .withf(move |r| r.run_id == run_id)
            .times(3)
            .returning(|r| Ok(stored(r)));

        let mut links = MockLinkRepository::new();
        links
            .expect_update_validity()
            .withf(|id, valid, _| (*id == 2) != *valid)
            .times(3)
            .returning(|_, _, _| Ok(true));

        let (tx, rx) = mpsc::channel(8);
        tx.send(ok_outcome(1)).await.unwrap();
        tx.send(failed_outcome(2)).await.unwrap();
        tx.send(ok_outcome(3)).await.unwrap();

        let progress =
            run_result_collector(rx, run.clone(), Arc::new(links), Arc::new(results), POLL).await;

        assert_eq!(progress.processed, 3);
        assert_eq!(progress.valid, 2);
        assert_eq!(progress.invalid, 1);
        assert!(!run.is_running());
    }

    #[tokio::test]
    async fn test_collector_skips_failed_writes() {
        let run = Arc::new(CheckRun::start(2));

        let mut results = MockCheckResultRepository::new();
        results
            .expect_append_result()
            .times(2)
            .returning(|_| Err(AppError::internal("Database error", json!({}))));

        let mut links = MockLinkRepository::new();
        links
            .expect_update_validity()
            .times(2)
            .returning(|_, _, _| Err(AppError::internal("Database error", json!({}))));

        let (tx, rx) = mpsc::channel(8);
        tx.send(ok_outcome(1)).await.unwrap();
        tx.send(ok_outcome(2)).await.unwrap();

        let progress =
            run_result_collector(rx, run.clone(), Arc::new(links), Arc::new(results), POLL).await;

        assert_eq!(progress.processed, 2);
        assert_eq!(progress.valid, 2);
        assert!(!run.is_running());
    }

    #[tokio::test]
    async fn test_collector_stops_on_completion_marker() {
        let run = Arc::new(CheckRun::start(5));
        run.request_stop();

        let mut results = MockCheckResultRepository::new();
        results
            .expect_append_result()
            .times(1)
            .returning(|r| Ok(stored(r)));
        let mut links = MockLinkRepository::new();
        links
            .expect_update_validity()
            .times(1)
            .returning(|_, _, _| Ok(true));

        let (tx, rx) = mpsc::channel(8);
        tx.send(ok_outcome(1)).await.unwrap();
        tx.send(CollectorEvent::Finished(DispatchSummary {
            batches: 1,
            dispatched: 1,
            cancelled: true,
        }))
        .await
        .unwrap();

        let progress =
            run_result_collector(rx, run.clone(), Arc::new(links), Arc::new(results), POLL).await;

        assert_eq!(progress.processed, 1);
        assert!(!run.is_running());
        assert!(run.finished_at().is_some());
    }

    #[tokio::test]
    async fn test_collector_outlives_idle_polls() {
        let run = Arc::new(CheckRun::start(1));

        let mut results = MockCheckResultRepository::new();
        results
            .expect_append_result()
            .times(1)
            .returning(|r| Ok(stored(r)));
        let mut links = MockLinkRepository::new();
        links
            .expect_update_validity()
            .times(1)
            .returning(|_, _, _| Ok(false));

        let (tx, rx) = mpsc::channel(8);
        let collector = tokio::spawn(run_result_collector(
            rx,
            run.clone(),
            Arc::new(links),
            Arc::new(results),
            Duration::from_millis(10),
        ));

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(run.is_running());

        tx.send(CollectorEvent::Outcome(CheckOutcome::failed(
            &Link::new(1, "https://slow.test"),
            ErrorKind::Timeout,
            "Request timed out".to_string(),
            Duration::from_secs(15),
        )))
        .await
        .unwrap();

        let progress = collector.await.unwrap();
        assert_eq!(progress.invalid, 1);
        assert!(!run.is_running());
    }

    #[tokio::test]
    async fn test_collector_finishes_when_channel_closes() {
        let run = Arc::new(CheckRun::start(4));
        let (tx, rx) = mpsc::channel::<CollectorEvent>(8);
        drop(tx);

        let progress = run_result_collector(
            rx,
            run.clone(),
            Arc::new(MockLinkRepository::new()),
            Arc::new(MockCheckResultRepository::new()),
            POLL,
        )
        .await;

        assert_eq!(progress.processed, 0);
        assert!(!run.is_running());
    }

    #[tokio::test]
    async fn test_collector_with_empty_snapshot() {
        let run = Arc::new(CheckRun::start(0));
        let (tx, rx) = mpsc::channel(8);
        tx.send(CollectorEvent::Finished(DispatchSummary::default()))
            .await
            .unwrap();

        let progress = run_result_collector(
            rx,
            run.clone(),
            Arc::new(MockLinkRepository::new()),
            Arc::new(MockCheckResultRepository::new()),
            POLL,
        )
        .await;

        assert_eq!(progress, ProgressSnapshot::default());
        assert!(!run.is_running());
    }
}
