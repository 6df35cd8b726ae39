//! Prometheus metrics for the draft engine and turn scheduler.
//!
//! The server registers everything returned by [`all_metrics`] into its registry.

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Engine
// =============================================================================

/// Committed picks by method.
pub static PICKS_COMMITTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("snakedraft_picks_committed_total", "Picks written to the ledger"),
        &["method"], // "manual", "auto"
    )
    .unwrap()
});

/// Rejected pick attempts by error kind.
pub static PICKS_REJECTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("snakedraft_picks_rejected_total", "Pick attempts rejected"),
        &["method", "reason"],
    )
    .unwrap()
});

/// Time spent inside the commit path.
pub static COMMIT_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "snakedraft_commit_duration_seconds",
            "Duration of the atomic pick commit",
        )
        .buckets(vec![0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.5]),
        &["method"],
    )
    .unwrap()
});

/// Drafts that reached Completed.
pub static DRAFTS_COMPLETED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("snakedraft_drafts_completed_total", "Drafts completed").unwrap()
});

/// Drafts halted by a stall.
pub static DRAFTS_STALLED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "snakedraft_drafts_stalled_total",
        "Drafts paused because automatic progress was impossible",
    )
    .unwrap()
});

// =============================================================================
// Scheduler
// =============================================================================

/// Deadline entries processed by outcome.
pub static DEADLINES_FIRED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "snakedraft_deadlines_fired_total",
            "Deadline entries popped by the scheduler",
        ),
        &["outcome"], // "auto_picked", "stale", "stalled", "rejected", "retry"
    )
    .unwrap()
});

/// Entries currently in the deadline heap, stale ones included.
pub static PENDING_DEADLINES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "snakedraft_pending_deadlines",
        "Deadline entries waiting in the scheduler heap",
    )
    .unwrap()
});

// =============================================================================
// Event log
// =============================================================================

/// Events persisted by the writer, by event type.
pub static EVENTS_WRITTEN: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("snakedraft_events_written_total", "Draft events stored"),
        &["event_type"],
    )
    .unwrap()
});

/// Events the writer could not store.
pub static EVENTS_DROPPED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "snakedraft_events_dropped_total",
            "Draft events lost to storage errors",
        ),
        &["event_type"],
    )
    .unwrap()
});

/// Pick events stored out of pick order for their draft.
pub static EVENT_PICK_GAPS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "snakedraft_event_pick_gaps_total",
        "Pick events that did not follow the previous stored pick",
    )
    .unwrap()
});

/// All core metrics, for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(PICKS_COMMITTED.clone()),
        Box::new(PICKS_REJECTED.clone()),
        Box::new(COMMIT_DURATION.clone()),
        Box::new(DRAFTS_COMPLETED.clone()),
        Box::new(DRAFTS_STALLED.clone()),
        Box::new(DEADLINES_FIRED.clone()),
        Box::new(PENDING_DEADLINES.clone()),
        Box::new(EVENTS_WRITTEN.clone()),
        Box::new(EVENTS_DROPPED.clone()),
        Box::new(EVENT_PICK_GAPS.clone()),
    ]
}
