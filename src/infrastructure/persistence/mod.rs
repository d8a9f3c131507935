//! PostgreSQL repository implementations.
//!
//! Concrete implementations of domain repository traits using SQLx.
//!
//! # Repositories
//!
//! - [`PgLinkRepository`] - Link snapshot reads and validity write-back
//! - [`PgCheckResultRepository`] - Check result storage and retrieval

pub mod pg_check_result_repository;
pub mod pg_link_repository;

pub use pg_check_result_repository::PgCheckResultRepository;
pub use pg_link_repository::PgLinkRepository;
