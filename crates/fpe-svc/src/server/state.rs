//! Shared application state injected into every Axum handler.

use crate::engine::EngineStore;

/// Application state shared across all request handlers.
///
/// Cheap to clone: the store is `Arc`-backed.
#[derive(Clone, Default)]
pub struct AppState {
    /// Lock-free slot holding the current transform engine.
    pub engines: EngineStore,
}

impl AppState {
    pub fn new(engines: EngineStore) -> Self {
        Self { engines }
    }
}
