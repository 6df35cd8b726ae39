//! Snake-draft orchestration engine.
//!
//! Participants take turns drafting castaways from a shared pool in snake
//! order. Every committed pick is appended to a durable ledger; turns that
//! run out are filled by a deterministic auto-pick.

pub mod clock;
pub mod config;
pub mod draft;
pub mod engine;
pub mod events;
pub mod metrics;
pub mod scheduler;
pub mod testing;

pub use clock::{Clock, SystemClock};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DraftConfig,
    OddParticipantPolicy,
};
pub use draft::{
    DraftError, DraftFilter, DraftPick, DraftReader, DraftSession, DraftSnapshot, DraftStatus,
    DraftStore, PickMethod, SnakeOrder, SqliteDraftStore,
};
pub use engine::{CreateDraftRequest, DraftEngine, PickRequest, RecoveryReport, StartDraftRequest};
pub use events::{create_event_system, DraftEvent, EventHandle, EventStore, SqliteEventStore};
pub use scheduler::{SchedulerConfig, SchedulerStatus, TurnScheduler};
