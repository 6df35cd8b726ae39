//! Draft domain: data model, snake order, auto-pick policy, ledger replay and storage.

mod autopick;
mod error;
mod ledger;
mod order;
mod sqlite_store;
mod store;
mod types;

pub use autopick::{AutoPickChoice, AutoPickSelector, AutoPickSource};
pub use error::{ConcurrencyError, DraftError, PersistenceError, SchedulerError, ValidationError};
pub use ledger::{replay, LedgerError, ReplayedDraft};
pub use order::SnakeOrder;
pub use sqlite_store::SqliteDraftStore;
pub use store::{DraftFilter, DraftReader, DraftStore, PickCommit, SessionStart, StoreError};
pub use types::{
    CastawayPoolEntry, DraftPick, DraftSession, DraftSnapshot, DraftStatus, ParticipantRanking,
    ParticipantRoster, PickMethod,
};
