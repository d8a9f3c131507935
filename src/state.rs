//! Shared application state injected into HTTP handlers.

use std::sync::Arc;

use crate::application::services::CheckController;

/// Shared state for all handlers.
///
/// Cloned per request; the controller itself is shared behind an [`Arc`].
#[derive(Clone)]
pub struct AppState {
    pub check_controller: Arc<CheckController>,
}

impl AppState {
    pub fn new(check_controller: Arc<CheckController>) -> Self {
        Self { check_controller }
    }
}
