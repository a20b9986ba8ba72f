//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use matcher_core::{CandidateProvider, MatchingContext};
use std::sync::Arc;
use tokio::sync::Mutex;

/// The shared application state, created once at startup and passed to all handlers.
///
/// The matching context sits behind a mutex so every request runs as one
/// uninterrupted operation on the store.
pub struct AppState {
    pub matcher: Mutex<MatchingContext>,
    pub provider: Arc<dyn CandidateProvider>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        matcher: MatchingContext,
        provider: Arc<dyn CandidateProvider>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            matcher: Mutex::new(matcher),
            provider,
            config,
        }
    }
}
