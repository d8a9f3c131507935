//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod checks;
pub mod health;

pub use checks::{
    check_results_handler, check_status_handler, start_check_handler, stop_check_handler,
};
pub use health::health_handler;
