//! Core draft data types.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Session Status
// ============================================================================

/// Lifecycle status of a draft session.
///
/// ```text
/// NotStarted -> InProgress -> Completed
///               InProgress <-> Paused
///               InProgress | Paused | NotStarted -> Aborted
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    NotStarted,
    InProgress,
    Paused,
    Completed,
    Aborted,
}

impl DraftStatus {
    /// Stable string form, also used as the stored column value.
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftStatus::NotStarted => "not_started",
            DraftStatus::InProgress => "in_progress",
            DraftStatus::Paused => "paused",
            DraftStatus::Completed => "completed",
            DraftStatus::Aborted => "aborted",
        }
    }

    /// Parse the stored column value.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "not_started" => Some(DraftStatus::NotStarted),
            "in_progress" => Some(DraftStatus::InProgress),
            "paused" => Some(DraftStatus::Paused),
            "completed" => Some(DraftStatus::Completed),
            "aborted" => Some(DraftStatus::Aborted),
            _ => None,
        }
    }

    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DraftStatus::Completed | DraftStatus::Aborted)
    }

    /// All statuses, in lifecycle order.
    pub fn all() -> [DraftStatus; 5] {
        [
            DraftStatus::NotStarted,
            DraftStatus::InProgress,
            DraftStatus::Paused,
            DraftStatus::Completed,
            DraftStatus::Aborted,
        ]
    }
}

impl std::fmt::Display for DraftStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Picks
// ============================================================================

/// How a pick reached the ledger.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PickMethod {
    /// Submitted by the participant.
    Manual,
    /// Chosen by the engine after the turn deadline elapsed.
    Auto,
}

impl PickMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PickMethod::Manual => "manual",
            PickMethod::Auto => "auto",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "manual" => Some(PickMethod::Manual),
            "auto" => Some(PickMethod::Auto),
            _ => None,
        }
    }
}

impl std::fmt::Display for PickMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One committed ledger entry. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DraftPick {
    pub session_id: String,
    /// Zero-based, contiguous position in the session's pick sequence.
    pub pick_index: u32,
    pub participant_id: String,
    pub castaway_id: String,
    pub method: PickMethod,
    pub committed_at: DateTime<Utc>,
}

// ============================================================================
// Pool and Rankings
// ============================================================================

/// A castaway in a session's pool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CastawayPoolEntry {
    pub castaway_id: String,
    pub available: bool,
}

/// A participant's preference order over castaways. Supplied externally.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParticipantRanking {
    pub participant_id: String,
    pub castaway_ids: Vec<String>,
}

// ============================================================================
// Session
// ============================================================================

/// Authoritative state of one draft session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DraftSession {
    pub id: String,
    /// Participants in first-round order. Empty until the draft starts.
    pub participants: Vec<String>,
    pub roster_size: u32,
    pub turn_duration_secs: u32,
    /// Index of the next pick to be made.
    pub pick_index: u32,
    /// Incremented exactly once per committed pick.
    pub version: u32,
    pub status: DraftStatus,
    /// Deadline for the pick at `pick_index`, if a turn is running.
    pub current_deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DraftSession {
    /// Number of picks after which the draft is complete.
    pub fn total_picks(&self) -> u32 {
        self.participants.len() as u32 * self.roster_size
    }

    /// Whether every slot has been filled.
    pub fn is_full(&self) -> bool {
        !self.participants.is_empty() && self.pick_index >= self.total_picks()
    }

    pub fn turn_duration(&self) -> Duration {
        Duration::seconds(i64::from(self.turn_duration_secs))
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// Picks made so far by one participant, in pick order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParticipantRoster {
    pub participant_id: String,
    pub castaway_ids: Vec<String>,
}

/// Read-only view of a draft returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DraftSnapshot {
    pub session_id: String,
    pub status: DraftStatus,
    pub pick_index: u32,
    pub version: u32,
    pub total_picks: u32,
    pub roster_size: u32,
    pub turn_duration_secs: u32,
    /// Participant expected at `pick_index`, while the draft is running or paused.
    pub current_picker: Option<String>,
    pub current_deadline: Option<DateTime<Utc>>,
    pub available_castaways: usize,
    pub rosters: Vec<ParticipantRoster>,
}
