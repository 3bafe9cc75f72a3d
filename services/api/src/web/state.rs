//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use std::sync::Arc;
use study_buddy_core::ports::{CardGenerationService, DatabaseService, PlanGenerationService};

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub plan_adapter: Arc<dyn PlanGenerationService>,
    pub card_adapter: Arc<dyn CardGenerationService>,
}
