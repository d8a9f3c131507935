//! Repository trait definitions for the domain layer.
//!
//! These traits abstract data access for the checker. Concrete implementations
//! live in `crate::infrastructure::persistence`; mock implementations are
//! generated via `mockall` for unit tests.
//!
//! # Available Repositories
//!
//! - [`LinkRepository`] - Read links, write back their cached validity
//! - [`CheckResultRepository`] - Append, query and clear check results
//!
//! # Testing
//!
//! See integration tests in `tests/repository_*.rs` for usage examples.

pub mod check_result_repository;
pub mod link_repository;

pub use check_result_repository::{CheckResultRepository, ResultFilter};
pub use link_repository::LinkRepository;

#[cfg(test)]
pub use check_result_repository::MockCheckResultRepository;
#[cfg(test)]
pub use link_repository::MockLinkRepository;
