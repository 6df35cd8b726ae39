//! Ledger replay.
//!
//! A session's pick index, pool availability and rosters are rebuilt from an
//! empty state by applying each ledger entry in order, checking every entry
//! against the snake order. Crash recovery relies on this being the only
//! derivation that matters.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use super::{DraftPick, ParticipantRoster, SnakeOrder};

/// Why a ledger could not be replayed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("gap in ledger: expected pick {expected}, found {found}")]
    Gap { expected: u32, found: u32 },

    #[error("pick {pick_index} recorded for {recorded}, but the order assigns {expected}")]
    WrongPicker {
        pick_index: u32,
        expected: String,
        recorded: String,
    },

    #[error("castaway {castaway_id} drafted twice (again at pick {pick_index})")]
    DuplicateCastaway { castaway_id: String, pick_index: u32 },

    #[error("pick {pick_index} drafts {castaway_id}, which is not in the pool")]
    UnknownCastaway { castaway_id: String, pick_index: u32 },

    #[error("pick {pick_index} exceeds the draft size of {total}")]
    Overflow { pick_index: u32, total: u32 },
}

/// State derived purely from the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayedDraft {
    /// Next pick index.
    pub pick_index: u32,
    /// Castaways still undrafted.
    pub available: BTreeSet<String>,
    pub rosters: Vec<ParticipantRoster>,
    pub complete: bool,
}

/// Rebuild draft state from `picks`, which must be sorted by pick index.
pub fn replay(
    participants: &[String],
    roster_size: u32,
    pool: &[String],
    picks: &[DraftPick],
) -> Result<ReplayedDraft, LedgerError> {
    let order = SnakeOrder::new(participants);
    let total = participants.len() as u32 * roster_size;

    let mut available: BTreeSet<String> = pool.iter().cloned().collect();
    let mut drafted: BTreeSet<&str> = BTreeSet::new();
    let mut rosters: BTreeMap<&str, Vec<String>> = participants
        .iter()
        .map(|p| (p.as_str(), Vec::new()))
        .collect();

    for (expected, pick) in (0u32..).zip(picks) {
        if pick.pick_index != expected {
            return Err(LedgerError::Gap {
                expected,
                found: pick.pick_index,
            });
        }
        if expected >= total {
            return Err(LedgerError::Overflow {
                pick_index: expected,
                total,
            });
        }

        let owner = order.picker_at(expected).unwrap_or_default();
        if owner != pick.participant_id {
            return Err(LedgerError::WrongPicker {
                pick_index: expected,
                expected: owner.to_string(),
                recorded: pick.participant_id.clone(),
            });
        }

        if !drafted.insert(pick.castaway_id.as_str()) {
            return Err(LedgerError::DuplicateCastaway {
                castaway_id: pick.castaway_id.clone(),
                pick_index: expected,
            });
        }
        if !available.remove(&pick.castaway_id) {
            return Err(LedgerError::UnknownCastaway {
                castaway_id: pick.castaway_id.clone(),
                pick_index: expected,
            });
        }

        if let Some(roster) = rosters.get_mut(owner) {
            roster.push(pick.castaway_id.clone());
        }
    }

    let pick_index = picks.len() as u32;
    let rosters = participants
        .iter()
        .map(|p| ParticipantRoster {
            participant_id: p.clone(),
            castaway_ids: rosters.remove(p.as_str()).unwrap_or_default(),
        })
        .collect();

    Ok(ReplayedDraft {
        pick_index,
        available,
        rosters,
        complete: total > 0 && pick_index == total,
    })
}
