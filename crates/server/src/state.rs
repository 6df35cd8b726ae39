use std::sync::Arc;

use snakedraft_core::{Config, DraftEngine, EventStore, TurnScheduler};

/// Shared application state.
///
/// Handlers reach draft state only through the engine; the draft store is
/// never exposed here.
pub struct AppState {
    config: Config,
    engine: Arc<DraftEngine>,
    scheduler: Option<Arc<TurnScheduler>>,
    event_store: Arc<dyn EventStore>,
}

impl AppState {
    pub fn new(
        config: Config,
        engine: Arc<DraftEngine>,
        scheduler: Option<Arc<TurnScheduler>>,
        event_store: Arc<dyn EventStore>,
    ) -> Self {
        Self {
            config,
            engine,
            scheduler,
            event_store,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn engine(&self) -> &DraftEngine {
        self.engine.as_ref()
    }

    /// None when the scheduler is disabled in config.
    pub fn scheduler(&self) -> Option<&TurnScheduler> {
        self.scheduler.as_deref()
    }

    pub fn event_store(&self) -> &dyn EventStore {
        self.event_store.as_ref()
    }
}
