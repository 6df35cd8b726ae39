//! Test doubles and fixtures for exercising the engine and scheduler.
//!
//! # Example
//!
//! ```rust,ignore
//! use snakedraft_core::testing::fixtures::EngineHarness;
//!
//! let h = EngineHarness::new();
//! let id = h.create_and_start("d1", &["alice", "bob"], 2, 4).await;
//!
//! // Let the first turn expire
//! h.clock.advance(chrono::Duration::seconds(30));
//! ```

mod failing_store;
mod manual_clock;

pub use failing_store::FailingDraftStore;
pub use manual_clock::ManualClock;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::sync::{Arc, Mutex};

    use chrono::{DateTime, TimeZone, Utc};
    use tokio::sync::mpsc;

    use super::ManualClock;
    use crate::config::DraftConfig;
    use crate::draft::{DraftStore, SqliteDraftStore};
    use crate::engine::{CreateDraftRequest, DraftEngine, StartDraftRequest};
    use crate::events::{DraftEvent, EventEnvelope, EventHandle};

    /// Turn length used by [`EngineHarness::create_and_start`].
    pub const TURN_SECS: u32 = 30;

    /// Castaway ids `c01..cNN`, already in ascending order.
    pub fn castaways(count: usize) -> Vec<String> {
        (1..=count).map(|i| format!("c{:02}", i)).collect()
    }

    pub fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    /// Fixed start time for manual clocks.
    pub fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0)
            .single()
            .unwrap_or_default()
    }

    /// An engine over an in-memory store with a manual clock.
    ///
    /// Events are kept in the channel instead of being persisted, so tests can
    /// drain and inspect them.
    pub struct EngineHarness {
        pub engine: Arc<DraftEngine>,
        pub store: Arc<dyn DraftStore>,
        pub clock: Arc<ManualClock>,
        events: Mutex<mpsc::Receiver<EventEnvelope>>,
    }

    impl Default for EngineHarness {
        fn default() -> Self {
            Self::new()
        }
    }

    impl EngineHarness {
        pub fn new() -> Self {
            Self::with_config(DraftConfig::default())
        }

        pub fn with_config(config: DraftConfig) -> Self {
            let store = SqliteDraftStore::in_memory().unwrap_or_else(|e| {
                panic!("in-memory draft store: {}", e);
            });
            Self::with_store(Arc::new(store), config)
        }

        pub fn with_store(store: Arc<dyn DraftStore>, config: DraftConfig) -> Self {
            let clock = Arc::new(ManualClock::new(epoch()));
            let (tx, rx) = mpsc::channel(4096);
            let engine = DraftEngine::new(
                Arc::clone(&store),
                EventHandle::new(tx),
                clock.clone(),
                config,
            );
            Self {
                engine: Arc::new(engine),
                store,
                clock,
                events: Mutex::new(rx),
            }
        }

        /// Create a NotStarted draft over `castaways(pool)`.
        pub async fn create(&self, id: &str, pool: usize) -> String {
            self.engine
                .create_draft(CreateDraftRequest {
                    session_id: Some(id.to_string()),
                    castaway_ids: castaways(pool),
                })
                .await
                .unwrap_or_else(|e| panic!("create draft {}: {}", id, e))
                .session_id
        }

        /// Create and start a draft with [`TURN_SECS`] turns.
        pub async fn create_and_start(
            &self,
            id: &str,
            participants: &[&str],
            roster_size: u32,
            pool: usize,
        ) -> String {
            let id = self.create(id, pool).await;
            self.engine
                .start_draft(
                    &id,
                    StartDraftRequest {
                        participants: names(participants),
                        roster_size,
                        turn_duration_secs: Some(TURN_SECS),
                    },
                )
                .await
                .unwrap_or_else(|e| panic!("start draft {}: {}", id, e));
            id
        }

        /// Every event emitted since the last drain, oldest first.
        pub fn drain_events(&self) -> Vec<DraftEvent> {
            let mut rx = self.events.lock().unwrap_or_else(|e| e.into_inner());
            let mut events = Vec::new();
            while let Ok(envelope) = rx.try_recv() {
                events.push(envelope.event);
            }
            events
        }

        pub fn event_types(&self) -> Vec<&'static str> {
            self.drain_events()
                .iter()
                .map(|event| event.event_type())
                .collect()
        }
    }
}
