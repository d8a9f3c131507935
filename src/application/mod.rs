//! Application layer orchestrating check runs.
//!
//! Services here coordinate the domain pieces (validator, collector,
//! repositories) and expose a small API to HTTP handlers and the admin CLI.
//!
//! # Available Services
//!
//! - [`services::CheckController`] - Run life cycle: start, stop, status, results
//! - [`services::BatchScheduler`] - Batched dispatch with a bounded worker pool
//! - [`services::status_reporter`] - Progress snapshots and time estimates

pub mod services;
