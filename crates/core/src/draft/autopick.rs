//! Castaway selection for participants who miss their deadline.

use serde::{Deserialize, Serialize};

use super::{CastawayPoolEntry, SchedulerError};

/// Where an auto-pick came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AutoPickSource {
    /// First available castaway in the participant's ranking.
    Ranking,
    /// Lowest castaway id still available.
    Fallback,
}

/// Result of an auto-pick selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoPickChoice {
    pub castaway_id: String,
    pub source: AutoPickSource,
}

/// Deterministic auto-pick policy: ranked first, then pool id ascending.
///
/// Never random. The same ranking and pool always yield the same castaway,
/// which is what keeps replays and tests reproducible.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoPickSelector;

impl AutoPickSelector {
    pub fn select(
        &self,
        ranking: Option<&[String]>,
        pool: &[CastawayPoolEntry],
    ) -> Result<AutoPickChoice, SchedulerError> {
        let is_available = |id: &str| {
            pool.iter()
                .any(|entry| entry.available && entry.castaway_id == id)
        };

        if let Some(ranked) = ranking {
            if let Some(id) = ranked.iter().find(|id| is_available(id)) {
                return Ok(AutoPickChoice {
                    castaway_id: id.clone(),
                    source: AutoPickSource::Ranking,
                });
            }
        }

        pool.iter()
            .filter(|entry| entry.available)
            .map(|entry| &entry.castaway_id)
            .min()
            .map(|id| AutoPickChoice {
                castaway_id: id.clone(),
                source: AutoPickSource::Fallback,
            })
            .ok_or_else(|| SchedulerError::Stalled {
                reason: "no castaways remain in the pool".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(entries: &[(&str, bool)]) -> Vec<CastawayPoolEntry> {
        entries
            .iter()
            .map(|(id, available)| CastawayPoolEntry {
                castaway_id: id.to_string(),
                available: *available,
            })
            .collect()
    }

    fn ranking(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_first_available_ranked_castaway_wins() {
        let pool = pool(&[("c1", false), ("c2", true), ("c3", true)]);
        let ranked = ranking(&["c1", "c3", "c2"]);

        let choice = AutoPickSelector.select(Some(&ranked), &pool).unwrap();
        assert_eq!(choice.castaway_id, "c3");
        assert_eq!(choice.source, AutoPickSource::Ranking);
    }

    #[test]
    fn test_ranking_entries_outside_pool_are_skipped() {
        let pool = pool(&[("c1", true)]);
        let ranked = ranking(&["ghost", "c1"]);

        let choice = AutoPickSelector.select(Some(&ranked), &pool).unwrap();
        assert_eq!(choice.castaway_id, "c1");
    }

    #[test]
    fn test_no_ranking_falls_back_to_lowest_id() {
        let pool = pool(&[("c9", true), ("c10", true), ("c2", true)]);

        let choice = AutoPickSelector.select(None, &pool).unwrap();
        assert_eq!(choice.castaway_id, "c10");
        assert_eq!(choice.source, AutoPickSource::Fallback);
    }

    #[test]
    fn test_exhausted_ranking_falls_back() {
        let pool = pool(&[("a", false), ("b", true), ("z", true)]);
        let ranked = ranking(&["a"]);

        let choice = AutoPickSelector.select(Some(&ranked), &pool).unwrap();
        assert_eq!(choice.castaway_id, "b");
        assert_eq!(choice.source, AutoPickSource::Fallback);
    }

    #[test]
    fn test_empty_pool_stalls() {
        let pool = pool(&[("a", false), ("b", false)]);
        let ranked = ranking(&["a", "b"]);

        let err = AutoPickSelector.select(Some(&ranked), &pool).unwrap_err();
        assert!(matches!(err, SchedulerError::Stalled { .. }));
    }

    #[test]
    fn test_selection_is_deterministic() {
        let pool = pool(&[("m", true), ("k", true), ("x", false)]);
        let first = AutoPickSelector.select(None, &pool).unwrap();
        for _ in 0..10 {
            assert_eq!(AutoPickSelector.select(None, &pool).unwrap(), first);
        }
    }
}
