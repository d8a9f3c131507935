//! Batched, bounded-concurrency dispatch of link validations.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::application::services::status_reporter::{
    estimate_remaining, format_elapsed, progress_percent,
};
use crate::domain::check_outcome::{CollectorEvent, DispatchSummary};
use crate::domain::entities::{CheckRun, Link};
use crate::domain::link_validator::LinkValidator;

/// Default number of links per batch.
pub const DEFAULT_BATCH_SIZE: usize = 20;
/// Default number of concurrent validations within a batch.
pub const DEFAULT_POOL_SIZE: usize = 5;
/// Default pause between two batches.
pub const DEFAULT_BATCH_PAUSE: Duration = Duration::from_secs(1);

/// Splits the link snapshot into batches and validates each batch with a
/// bounded worker pool.
///
/// Batches run strictly one after another. Within a batch at most
/// `min(pool_size, batch_len)` validations are in flight. The batch size bounds
/// how much work is dispatched at once; the pool size bounds concurrent
/// outbound connections.
///
/// # Cancellation
///
/// The run's token is checked before each batch and interrupts the pause
/// between batches. Validations already dispatched always finish.
#[derive(Debug, Clone)]
pub struct BatchScheduler {
    batch_size: usize,
    pool_size: usize,
    pause: Duration,
}

impl Default for BatchScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE, DEFAULT_POOL_SIZE, DEFAULT_BATCH_PAUSE)
    }
}

impl BatchScheduler {
    /// Creates a scheduler. Zero sizes are raised to one.
    pub fn new(batch_size: usize, pool_size: usize, pause: Duration) -> Self {
        Self {
            batch_size: batch_size.max(1),
            pool_size: pool_size.max(1),
            pause,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Dispatches every link of the snapshot, then sends the completion marker.
    pub async fn run(
        &self,
        links: Vec<Link>,
        validator: Arc<dyn LinkValidator>,
        tx: mpsc::Sender<CollectorEvent>,
        run: Arc<CheckRun>,
    ) -> DispatchSummary {
        let cancel = run.cancellation_token();
        let total_batches = links.len().div_ceil(self.batch_size);
        let mut summary = DispatchSummary::default();

        for (index, batch) in links.chunks(self.batch_size).enumerate() {
            if cancel.is_cancelled() {
                info!(
                    run_id = %run.id(),
                    remaining_batches = total_batches - index,
                    "Stop requested, no further batches dispatched"
                );
                break;
            }

            debug!(
                run_id = %run.id(),
                batch = index + 1,
                batches = total_batches,
                size = batch.len(),
                "Dispatching batch"
            );

            self.run_batch(batch, &validator, &tx, &cancel).await;
            summary.batches += 1;
            summary.dispatched += batch.len();

            log_batch_progress(&run, index + 1, total_batches);

            if index + 1 < total_batches {
                tokio::select! {
                    _ = tokio::time::sleep(self.pause) => {}
                    _ = cancel.cancelled() => {}
                }
            }
        }

        summary.cancelled = summary.dispatched < links.len();

        if tx.send(CollectorEvent::Finished(summary)).await.is_err() {
            debug!(run_id = %run.id(), "Collector finished before completion marker");
        }

        summary
    }

    /// Validates one batch and waits until every validation has finished.
    async fn run_batch(
        &self,
        batch: &[Link],
        validator: &Arc<dyn LinkValidator>,
        tx: &mpsc::Sender<CollectorEvent>,
        cancel: &CancellationToken,
    ) {
        let permits = Arc::new(Semaphore::new(self.pool_size.min(batch.len())));
        let mut tasks = JoinSet::new();

        for link in batch {
            let Ok(permit) = permits.clone().acquire_owned().await else {
                warn!("Worker pool closed, dropping rest of batch");
                break;
            };

            let link = link.clone();
            let validator = Arc::clone(validator);
            let tx = tx.clone();
            let cancel = cancel.clone();

            tasks.spawn(async move {
                let _permit = permit;
                let outcome = validator.validate(&link, &cancel).await;
                if tx.send(CollectorEvent::Outcome(outcome)).await.is_err() {
                    warn!(link_id = link.id, "Result channel closed, outcome dropped");
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Validation task failed");
            }
        }
    }
}

fn log_batch_progress(run: &CheckRun, batch: usize, batches: usize) {
    let progress = run.progress().snapshot();
    let elapsed = run.elapsed();
    let remaining = estimate_remaining(elapsed, progress.processed, run.total())
        .map(format_elapsed)
        .unwrap_or_else(|| "unknown".to_string());

    info!(
        run_id = %run.id(),
        batch,
        batches,
        processed = progress.processed,
        total = run.total(),
        percent = progress_percent(progress.processed, run.total()),
        valid = progress.valid,
        invalid = progress.invalid,
        elapsed = %format_elapsed(elapsed),
        remaining = %remaining,
        "Batch completed"
    );
}
