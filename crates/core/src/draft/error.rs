//! Error taxonomy for draft operations.

use thiserror::Error;

use super::DraftStatus;

/// Request rejected before any mutation. Refresh state and retry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("not {actual}'s turn: pick {pick_index} belongs to {expected}")]
    WrongTurn {
        pick_index: u32,
        expected: String,
        actual: String,
    },

    #[error("castaway {0} has already been drafted")]
    CastawayUnavailable(String),

    #[error("castaway {0} is not in this draft's pool")]
    UnknownCastaway(String),

    #[error("draft is not active (status: {status})")]
    DraftNotActive { status: DraftStatus },

    #[error("invalid participant: {0}")]
    InvalidParticipant(String),

    #[error("draft already started (status: {status})")]
    AlreadyStarted { status: DraftStatus },

    #[error("cannot {operation} a draft in status {status}")]
    InvalidTransition {
        operation: String,
        status: DraftStatus,
    },

    #[error("invalid draft configuration: {0}")]
    InvalidConfiguration(String),
}

/// The caller's view of the session is outdated.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConcurrencyError {
    #[error("stale pick index: expected {expected}, session is at {actual}")]
    StaleVersion { expected: u32, actual: u32 },
}

/// Durable storage failed. No partial state was applied.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("durable write failed: {0}")]
    WriteFailed(String),

    #[error("read failed: {0}")]
    ReadFailed(String),

    #[error("ledger for session {session_id} disagrees with stored state: {detail}")]
    LedgerMismatch { session_id: String, detail: String },
}

/// A forced auto-pick could not proceed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("draft stalled: {reason}")]
    Stalled { reason: String },
}

/// Top-level error for engine operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("draft session not found: {0}")]
    SessionNotFound(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Concurrency(#[from] ConcurrencyError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

impl DraftError {
    /// Short machine-readable label, used in API responses and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            DraftError::SessionNotFound(_) => "session_not_found",
            DraftError::Validation(v) => match v {
                ValidationError::WrongTurn { .. } => "wrong_turn",
                ValidationError::CastawayUnavailable(_) => "castaway_unavailable",
                ValidationError::UnknownCastaway(_) => "unknown_castaway",
                ValidationError::DraftNotActive { .. } => "draft_not_active",
                ValidationError::InvalidParticipant(_) => "invalid_participant",
                ValidationError::AlreadyStarted { .. } => "already_started",
                ValidationError::InvalidTransition { .. } => "invalid_transition",
                ValidationError::InvalidConfiguration(_) => "invalid_configuration",
            },
            DraftError::Concurrency(ConcurrencyError::StaleVersion { .. }) => "stale_version",
            DraftError::Persistence(p) => match p {
                PersistenceError::WriteFailed(_) => "write_failed",
                PersistenceError::ReadFailed(_) => "read_failed",
                PersistenceError::LedgerMismatch { .. } => "ledger_mismatch",
            },
            DraftError::Scheduler(SchedulerError::Stalled { .. }) => "stalled",
        }
    }

    /// Whether the same request may succeed after refreshing state.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DraftError::Concurrency(_)
                | DraftError::Persistence(PersistenceError::WriteFailed(_))
                | DraftError::Persistence(PersistenceError::ReadFailed(_))
        )
    }
}
