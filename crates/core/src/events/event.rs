use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::draft::{DraftStatus, PickMethod};

/// Domain events emitted by the draft engine.
///
/// These are an outbound record for external consumers (notifications,
/// leaderboards, audit). The engine never reads them back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DraftEvent {
    // System events
    ServiceStarted {
        version: String,
        config_hash: String,
    },
    ServiceStopped {
        reason: String,
    },

    // Session lifecycle
    DraftCreated {
        session_id: String,
        pool_size: usize,
    },
    DraftStarted {
        session_id: String,
        participants: Vec<String>,
        roster_size: u32,
        turn_duration_secs: u32,
    },
    DraftPaused {
        session_id: String,
        pick_index: u32,
    },
    DraftResumed {
        session_id: String,
        pick_index: u32,
        deadline: DateTime<Utc>,
    },
    DraftAborted {
        session_id: String,
        previous_status: DraftStatus,
    },
    DraftCompleted {
        session_id: String,
        total_picks: u32,
    },
    /// Automatic progress halted; the session has been paused.
    DraftStalled {
        session_id: String,
        reason: String,
    },

    // Picks
    PickMade {
        session_id: String,
        pick_index: u32,
        participant_id: String,
        castaway_id: String,
        method: PickMethod,
    },
    PickRejected {
        session_id: String,
        participant_id: String,
        pick_index: u32,
        method: PickMethod,
        /// Machine-readable error kind.
        reason: String,
    },
    TurnTimedOut {
        session_id: String,
        participant_id: String,
        pick_index: u32,
    },

    // Inputs
    RankingSubmitted {
        session_id: String,
        participant_id: String,
        ranked: usize,
    },
}

impl DraftEvent {
    /// Stable event name, matching the serialized `type` tag.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ServiceStarted { .. } => "service_started",
            Self::ServiceStopped { .. } => "service_stopped",
            Self::DraftCreated { .. } => "draft_created",
            Self::DraftStarted { .. } => "draft_started",
            Self::DraftPaused { .. } => "draft_paused",
            Self::DraftResumed { .. } => "draft_resumed",
            Self::DraftAborted { .. } => "draft_aborted",
            Self::DraftCompleted { .. } => "draft_completed",
            Self::DraftStalled { .. } => "draft_stalled",
            Self::PickMade { .. } => "pick_made",
            Self::PickRejected { .. } => "pick_rejected",
            Self::TurnTimedOut { .. } => "turn_timed_out",
            Self::RankingSubmitted { .. } => "ranking_submitted",
        }
    }

    /// Session the event belongs to, if any.
    pub fn session_id(&self) -> Option<&str> {
        match self {
            Self::ServiceStarted { .. } | Self::ServiceStopped { .. } => None,
            Self::DraftCreated { session_id, .. }
            | Self::DraftStarted { session_id, .. }
            | Self::DraftPaused { session_id, .. }
            | Self::DraftResumed { session_id, .. }
            | Self::DraftAborted { session_id, .. }
            | Self::DraftCompleted { session_id, .. }
            | Self::DraftStalled { session_id, .. }
            | Self::PickMade { session_id, .. }
            | Self::PickRejected { session_id, .. }
            | Self::TurnTimedOut { session_id, .. }
            | Self::RankingSubmitted { session_id, .. } => Some(session_id),
        }
    }

    /// Participant the event concerns, if any.
    pub fn participant_id(&self) -> Option<&str> {
        match self {
            Self::PickMade { participant_id, .. }
            | Self::PickRejected { participant_id, .. }
            | Self::TurnTimedOut { participant_id, .. }
            | Self::RankingSubmitted { participant_id, .. } => Some(participant_id),
            _ => None,
        }
    }
}

/// A stored event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub session_id: Option<String>,
    pub participant_id: Option<String>,
    pub data: DraftEvent,
}
