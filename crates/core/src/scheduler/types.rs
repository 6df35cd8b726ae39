//! Types for the turn scheduler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered turn deadline.
///
/// Ordered by deadline first, so a min-heap pops the earliest turn.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeadlineEntry {
    pub deadline: DateTime<Utc>,
    pub session_id: String,
    /// Pick index the deadline was registered for.
    pub pick_index: u32,
}

/// What happened to one popped deadline entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineOutcome {
    /// A forced auto-pick was committed.
    AutoPicked,
    /// The turn had already moved on, or the session was paused or finished.
    Stale,
    /// No castaway could be chosen; the session was paused.
    Stalled,
    /// The auto-pick failed for a reason retrying will not fix.
    Rejected,
    /// A durable write failed; the entry goes back on the heap.
    Retry,
}

impl DeadlineOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeadlineOutcome::AutoPicked => "auto_picked",
            DeadlineOutcome::Stale => "stale",
            DeadlineOutcome::Stalled => "stalled",
            DeadlineOutcome::Rejected => "rejected",
            DeadlineOutcome::Retry => "retry",
        }
    }
}

/// Summary of one scheduler tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    pub auto_picked: usize,
    pub stale: usize,
    pub stalled: usize,
    pub rejected: usize,
    pub retried: usize,
}

impl TickReport {
    pub fn record(&mut self, outcome: DeadlineOutcome) {
        match outcome {
            DeadlineOutcome::AutoPicked => self.auto_picked += 1,
            DeadlineOutcome::Stale => self.stale += 1,
            DeadlineOutcome::Stalled => self.stalled += 1,
            DeadlineOutcome::Rejected => self.rejected += 1,
            DeadlineOutcome::Retry => self.retried += 1,
        }
    }

    /// Total entries popped in this tick.
    pub fn fired(&self) -> usize {
        self.auto_picked + self.stale + self.stalled + self.rejected + self.retried
    }
}

/// Current status of the scheduler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerStatus {
    pub running: bool,
    /// Heap entries, including ones that will turn out stale.
    pub pending_deadlines: usize,
    pub next_deadline: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_entries_order_by_deadline_first() {
        let now = Utc::now();
        let early = DeadlineEntry {
            deadline: now,
            session_id: "z".to_string(),
            pick_index: 9,
        };
        let late = DeadlineEntry {
            deadline: now + Duration::seconds(1),
            session_id: "a".to_string(),
            pick_index: 0,
        };
        assert!(early < late);
    }

    #[test]
    fn test_tick_report_counts() {
        let mut report = TickReport::default();
        report.record(DeadlineOutcome::AutoPicked);
        report.record(DeadlineOutcome::Stale);
        report.record(DeadlineOutcome::Stale);
        assert_eq!(report.auto_picked, 1);
        assert_eq!(report.stale, 2);
        assert_eq!(report.fired(), 3);
    }
}
