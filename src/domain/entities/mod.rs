//! Core domain entities of the link checker.
//!
//! # Entity Types
//!
//! - [`Link`] - A stored link owned by the bookmark registry
//! - [`CheckRun`] - One detection campaign with its counters and life cycle
//! - [`CheckResult`] - The persisted outcome of checking one link in one run
//!
//! `NewCheckResult` is the creation counterpart of [`CheckResult`]; its
//! [`Verdict`] keeps the error kind present exactly when the link is invalid.

pub mod check_result;
pub mod check_run;
pub mod link;

pub use check_result::{CheckResult, ErrorKind, NewCheckResult, Verdict, is_accepted_status};
pub use check_run::{CheckRun, ProgressSnapshot, RunProgress, RunState};
pub use link::Link;
