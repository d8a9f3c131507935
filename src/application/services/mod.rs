//! Check run services for the application layer.

pub mod batch_scheduler;
pub mod check_controller;
pub mod status_reporter;

pub use batch_scheduler::BatchScheduler;
pub use check_controller::{CheckController, CheckSettings, StopOutcome};
pub use status_reporter::CheckStatus;
