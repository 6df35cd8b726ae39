//! Draft storage traits and types.
//!
//! Reads and writes are split: [`DraftReader`] is the read-only projection
//! handed to anything outside the engine, [`DraftStore`] adds the writes. The
//! ledger and pool availability are only ever written by
//! [`DraftStore::commit_pick`].

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::{
    CastawayPoolEntry, ConcurrencyError, DraftError, DraftPick, DraftSession, DraftStatus,
    ParticipantRanking, PersistenceError, PickMethod, ValidationError,
};

/// Error type for draft storage operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("draft session not found: {0}")]
    NotFound(String),

    #[error("draft session already exists: {0}")]
    AlreadyExists(String),

    #[error("stale pick index: expected {expected}, stored {actual}")]
    StaleVersion { expected: u32, actual: u32 },

    #[error("draft is not in progress (status: {status})")]
    NotActive { status: DraftStatus },

    #[error("draft already started (status: {status})")]
    AlreadyStarted { status: DraftStatus },

    #[error("cannot move draft from {from} to {to}")]
    InvalidTransition { from: DraftStatus, to: DraftStatus },

    #[error("pick {pick_index} belongs to {expected}, not {actual}")]
    WrongPicker {
        pick_index: u32,
        expected: String,
        actual: String,
    },

    #[error("castaway already drafted: {0}")]
    CastawayUnavailable(String),

    #[error("castaway not in pool: {0}")]
    UnknownCastaway(String),

    #[error("database error: {0}")]
    Database(String),
}

impl From<StoreError> for DraftError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => DraftError::SessionNotFound(id),
            StoreError::AlreadyExists(id) => ValidationError::InvalidConfiguration(format!(
                "draft session {} already exists",
                id
            ))
            .into(),
            StoreError::StaleVersion { expected, actual } => {
                ConcurrencyError::StaleVersion { expected, actual }.into()
            }
            StoreError::NotActive { status } => ValidationError::DraftNotActive { status }.into(),
            StoreError::AlreadyStarted { status } => {
                ValidationError::AlreadyStarted { status }.into()
            }
            StoreError::InvalidTransition { from, to } => ValidationError::InvalidTransition {
                operation: transition_verb(to).to_string(),
                status: from,
            }
            .into(),
            StoreError::WrongPicker {
                pick_index,
                expected,
                actual,
            } => ValidationError::WrongTurn {
                pick_index,
                expected,
                actual,
            }
            .into(),
            StoreError::CastawayUnavailable(id) => ValidationError::CastawayUnavailable(id).into(),
            StoreError::UnknownCastaway(id) => ValidationError::UnknownCastaway(id).into(),
            StoreError::Database(msg) => PersistenceError::WriteFailed(msg).into(),
        }
    }
}

fn transition_verb(to: DraftStatus) -> &'static str {
    match to {
        DraftStatus::NotStarted => "reset",
        DraftStatus::InProgress => "resume",
        DraftStatus::Paused => "pause",
        DraftStatus::Completed => "complete",
        DraftStatus::Aborted => "abort",
    }
}

/// Parameters for moving a session from NotStarted to InProgress.
#[derive(Debug, Clone)]
pub struct SessionStart {
    pub session_id: String,
    pub participants: Vec<String>,
    pub roster_size: u32,
    pub turn_duration_secs: u32,
    /// Deadline for pick 0.
    pub first_deadline: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
}

/// One atomic pick commit.
///
/// Applied only if the session is still InProgress at `expected_pick_index`.
/// On success the ledger row, the pool flag, the pick index, the version and
/// the deadline all change together.
#[derive(Debug, Clone)]
pub struct PickCommit {
    pub session_id: String,
    pub expected_pick_index: u32,
    pub participant_id: String,
    pub castaway_id: String,
    pub method: PickMethod,
    pub committed_at: DateTime<Utc>,
    /// Deadline for the following pick. Ignored when this pick completes the draft.
    pub next_deadline: DateTime<Utc>,
}

/// Filter for listing sessions.
#[derive(Debug, Clone)]
pub struct DraftFilter {
    pub status: Option<DraftStatus>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for DraftFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl DraftFilter {
    pub fn new() -> Self {
        Self {
            status: None,
            limit: 100,
            offset: 0,
        }
    }

    pub fn with_status(mut self, status: DraftStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Read-only projections over draft state.
pub trait DraftReader: Send + Sync {
    /// Get a session by id.
    fn get_session(&self, id: &str) -> Result<Option<DraftSession>, StoreError>;

    /// List sessions matching the filter, oldest first.
    fn list_sessions(&self, filter: &DraftFilter) -> Result<Vec<DraftSession>, StoreError>;

    /// Count sessions matching the filter. Limit and offset are ignored.
    fn count_sessions(&self, filter: &DraftFilter) -> Result<i64, StoreError>;

    /// Pool entries for a session, ordered by castaway id.
    fn pool(&self, session_id: &str) -> Result<Vec<CastawayPoolEntry>, StoreError>;

    /// Ledger entries for a session, ordered by pick index.
    fn ledger(&self, session_id: &str) -> Result<Vec<DraftPick>, StoreError>;

    /// A participant's ranking, if one was submitted.
    fn ranking(
        &self,
        session_id: &str,
        participant_id: &str,
    ) -> Result<Option<ParticipantRanking>, StoreError>;
}

/// Draft storage with write access. Held only by the engine.
pub trait DraftStore: DraftReader {
    /// Create a NotStarted session and seed its pool.
    fn create_session(
        &self,
        id: &str,
        castaway_ids: &[String],
        now: DateTime<Utc>,
    ) -> Result<DraftSession, StoreError>;

    /// Fix participants and roster size, and open pick 0.
    fn start_session(&self, start: &SessionStart) -> Result<DraftSession, StoreError>;

    /// Change status without touching the ledger, pick index or version.
    ///
    /// Fails with `InvalidTransition` unless the current status is in `allowed_from`.
    fn transition(
        &self,
        id: &str,
        allowed_from: &[DraftStatus],
        to: DraftStatus,
        deadline: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<DraftSession, StoreError>;

    /// Insert or replace a participant's ranking.
    fn put_ranking(
        &self,
        session_id: &str,
        ranking: &ParticipantRanking,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Append one pick and advance the session, all or nothing.
    fn commit_pick(&self, commit: &PickCommit) -> Result<DraftSession, StoreError>;
}
