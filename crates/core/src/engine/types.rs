//! Request and report types for the draft engine.

use serde::{Deserialize, Serialize};

/// Schedule a draft: create the session and its castaway pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDraftRequest {
    /// Generated when absent.
    #[serde(default)]
    pub session_id: Option<String>,
    pub castaway_ids: Vec<String>,
}

/// Start a NotStarted draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartDraftRequest {
    /// First-round pick order.
    pub participants: Vec<String>,
    pub roster_size: u32,
    /// Falls back to the configured default.
    #[serde(default)]
    pub turn_duration_secs: Option<u32>,
}

/// A participant's manual pick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickRequest {
    pub participant_id: String,
    /// Pick index the caller believes is current.
    pub expected_pick_index: u32,
    pub castaway_id: String,
}

/// Outcome of reloading sessions after a restart.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecoveryReport {
    /// InProgress sessions examined.
    pub sessions: usize,
    /// Sessions whose deadline went back on the heap.
    pub seeded: usize,
    /// Sessions whose ledger disagreed with stored state. These were paused.
    pub inconsistent: Vec<String>,
}
