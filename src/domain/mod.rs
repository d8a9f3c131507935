//! Domain layer containing the checker's entities and core pipeline pieces.
//!
//! # Architecture
//!
//! - [`entities`] - Links, check runs and check results
//! - [`repositories`] - Data access trait definitions
//! - [`link_validator`] - Contract for checking a single link
//! - [`check_outcome`] - Messages carried by the result channel
//! - [`result_collector`] - The single writer draining the result channel
//!
//! # Design Principles
//!
//! - Domain layer has no dependencies on infrastructure or presentation layers
//! - Repository and validator traits are implemented by the infrastructure layer
//! - Run orchestration lives in [`crate::application::services`]
//!
//! # Outcome Flow
//!
//! 1. The batch scheduler hands a [`entities::Link`] to a [`link_validator::LinkValidator`]
//! 2. The validator sends a [`check_outcome::CheckOutcome`] to the result channel
//! 3. [`result_collector::run_result_collector`] counts and persists it
//! 4. The link's cached validity is updated via [`repositories::LinkRepository`]

pub mod check_outcome;
pub mod entities;
pub mod link_validator;
pub mod repositories;
pub mod result_collector;
