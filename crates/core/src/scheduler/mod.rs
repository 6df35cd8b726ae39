//! Turn scheduler: fires forced auto-picks when turn deadlines elapse.
//!
//! The engine pushes a deadline whenever a turn opens. The scheduler pops due
//! entries and discards any whose turn has already ended, so a manual pick,
//! pause or abort never has to cancel anything.

mod config;
mod queue;
mod runner;
mod types;

pub use config::SchedulerConfig;
pub use queue::DeadlineQueue;
pub use runner::TurnScheduler;
pub use types::{DeadlineEntry, DeadlineOutcome, SchedulerStatus, TickReport};
