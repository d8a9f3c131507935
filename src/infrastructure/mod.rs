//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer.
//!
//! # Modules
//!
//! - [`http`] - reqwest-backed link validation
//! - [`persistence`] - PostgreSQL repository implementations

pub mod http;
pub mod persistence;
