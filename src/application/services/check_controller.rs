//! Run life cycle: start, stop, status and result queries.

use serde_json::json;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::services::batch_scheduler::{
    BatchScheduler, DEFAULT_BATCH_PAUSE, DEFAULT_BATCH_SIZE, DEFAULT_POOL_SIZE,
};
use crate::application::services::status_reporter::CheckStatus;
use crate::domain::entities::{CheckResult, CheckRun, ProgressSnapshot};
use crate::domain::link_validator::LinkValidator;
use crate::domain::repositories::{CheckResultRepository, LinkRepository, ResultFilter};
use crate::domain::result_collector::run_result_collector;
use crate::error::AppError;

/// Tunables of a check run.
#[derive(Debug, Clone)]
pub struct CheckSettings {
    pub batch_size: usize,
    pub pool_size: usize,
    pub batch_pause: Duration,
    pub queue_capacity: usize,
    pub collector_poll: Duration,
    /// Keep results of earlier runs instead of clearing them on start.
    pub retain_history: bool,
}

impl Default for CheckSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            pool_size: DEFAULT_POOL_SIZE,
            batch_pause: DEFAULT_BATCH_PAUSE,
            queue_capacity: 1000,
            collector_poll: Duration::from_secs(5),
            retain_history: false,
        }
    }
}

/// Result of a stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Cancellation was signalled to the given run.
    Requested(Uuid),
    /// No run was active.
    NotRunning,
}

#[derive(Default)]
struct RunSlot {
    current: Option<Arc<CheckRun>>,
    collector: Option<JoinHandle<ProgressSnapshot>>,
    starting: bool,
}

impl RunSlot {
    fn active_run(&self) -> Option<&Arc<CheckRun>> {
        self.current.as_ref().filter(|run| run.is_running())
    }
}

fn lock_slot(slot: &Mutex<RunSlot>) -> MutexGuard<'_, RunSlot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Held while a start loads its snapshot.
///
/// Dropping it without [`StartReservation::install`] releases the slot, so a
/// cancelled or failed start never blocks later ones.
struct StartReservation<'a> {
    slot: &'a Mutex<RunSlot>,
    armed: bool,
}

impl StartReservation<'_> {
    fn install(mut self, run: Arc<CheckRun>, collector: JoinHandle<ProgressSnapshot>) {
        let mut slot = lock_slot(self.slot);
        slot.current = Some(run);
        slot.collector = Some(collector);
        slot.starting = false;
        self.armed = false;
    }
}

impl Drop for StartReservation<'_> {
    fn drop(&mut self) {
        if self.armed {
            lock_slot(self.slot).starting = false;
        }
    }
}

/// Owns the single active check run.
///
/// At most one run is active at a time. Starting while a run is active (or
/// while another start is still loading the snapshot) is rejected. The last
/// run stays available for status and result queries after it completes.
pub struct CheckController {
    link_repository: Arc<dyn LinkRepository>,
    result_repository: Arc<dyn CheckResultRepository>,
    validator: Arc<dyn LinkValidator>,
    settings: CheckSettings,
    slot: Mutex<RunSlot>,
}

impl CheckController {
    pub fn new(
        link_repository: Arc<dyn LinkRepository>,
        result_repository: Arc<dyn CheckResultRepository>,
        validator: Arc<dyn LinkValidator>,
        settings: CheckSettings,
    ) -> Self {
        Self {
            link_repository,
            result_repository,
            validator,
            settings,
            slot: Mutex::new(RunSlot::default()),
        }
    }

    /// Starts a new run over the current link snapshot and returns its id.
    ///
    /// Returns once the run is installed; validation proceeds in background
    /// tasks.
    ///
    /// # Errors
    ///
    /// - [`AppError::Conflict`] if a run is already active
    /// - [`AppError::Internal`] if the snapshot cannot be loaded or earlier
    ///   results cannot be cleared; results of the previous run survive a
    ///   failed snapshot
    pub async fn start(&self) -> Result<Uuid, AppError> {
        let reservation = self.reserve()?;
        self.launch(reservation).await
    }

    fn reserve(&self) -> Result<StartReservation<'_>, AppError> {
        let mut slot = self.lock();

        if let Some(run) = slot.active_run() {
            return Err(AppError::conflict(
                "A check run is already in progress",
                json!({ "run_id": run.id() }),
            ));
        }
        if slot.starting {
            return Err(AppError::conflict(
                "A check run is already starting",
                json!({}),
            ));
        }

        slot.starting = true;
        Ok(StartReservation {
            slot: &self.slot,
            armed: true,
        })
    }

    async fn launch(&self, reservation: StartReservation<'_>) -> Result<Uuid, AppError> {
        let links = self.link_repository.list_links().await?;

        if !self.settings.retain_history {
            let cleared = self.result_repository.clear_results().await?;
            debug!(cleared, "Cleared previous check results");
        }

        let run = Arc::new(CheckRun::start(links.len()));
        let run_id = run.id();
        let (tx, rx) = mpsc::channel(self.settings.queue_capacity.max(1));

        info!(
            run_id = %run_id,
            total = links.len(),
            batch_size = self.settings.batch_size,
            pool_size = self.settings.pool_size,
            "Starting check run"
        );

        let collector = tokio::spawn(run_result_collector(
            rx,
            Arc::clone(&run),
            Arc::clone(&self.link_repository),
            Arc::clone(&self.result_repository),
            self.settings.collector_poll,
        ));

        let scheduler = BatchScheduler::new(
            self.settings.batch_size,
            self.settings.pool_size,
            self.settings.batch_pause,
        );
        let validator = Arc::clone(&self.validator);
        let scheduled_run = Arc::clone(&run);
        tokio::spawn(async move {
            scheduler.run(links, validator, tx, scheduled_run).await;
        });

        reservation.install(run, collector);

        Ok(run_id)
    }

    /// Requests cooperative cancellation of the active run.
    ///
    /// In-flight validations finish and are recorded; no new batch starts.
    pub fn stop(&self) -> StopOutcome {
        let slot = self.lock();

        match slot.active_run() {
            Some(run) if run.request_stop() => {
                info!(run_id = %run.id(), "Stop requested for check run");
                StopOutcome::Requested(run.id())
            }
            _ => StopOutcome::NotRunning,
        }
    }

    /// Status of the active run, or of the last run when none is active.
    pub fn status(&self) -> CheckStatus {
        self.lock()
            .current
            .as_deref()
            .map(CheckStatus::from_run)
            .unwrap_or_else(CheckStatus::idle)
    }

    /// Results recorded so far for `run_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn results(
        &self,
        run_id: Uuid,
        filter: ResultFilter,
    ) -> Result<Vec<CheckResult>, AppError> {
        self.result_repository.query_results(run_id, filter).await
    }

    /// Number of links a new run would check.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn link_count(&self) -> Result<i64, AppError> {
        self.link_repository.count_links().await
    }

    /// Waits until the current run's collector has finished.
    ///
    /// Returns the final counters, or `None` when no run was started or the
    /// collector was already awaited.
    pub async fn wait_for_completion(&self) -> Option<ProgressSnapshot> {
        let handle = self.lock().collector.take()?;

        match handle.await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(error = %e, "Result collector task failed");
                None
            }
        }
    }

    /// Stops the active run and waits up to `grace` for it to drain.
    pub async fn shutdown(&self, grace: Duration) {
        if let StopOutcome::Requested(run_id) = self.stop() {
            info!(run_id = %run_id, "Draining check run before shutdown");
        }

        if tokio::time::timeout(grace, self.wait_for_completion())
            .await
            .is_err()
        {
            warn!(grace_secs = grace.as_secs(), "Check run did not drain in time");
        }
    }

    fn lock(&self) -> MutexGuard<'_, RunSlot> {
        lock_slot(&self.slot)
    }
}
