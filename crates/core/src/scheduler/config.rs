//! Turn scheduler configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the turn scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Run the background deadline loop.
    /// When disabled, deadlines are still recorded but nothing fires them.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Longest single sleep of the loop (milliseconds).
    /// The clock is re-read at least this often, even with no deadline due.
    #[serde(default = "default_max_idle")]
    pub max_idle_ms: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_max_idle() -> u64 {
    1000
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_idle_ms: default_max_idle(),
        }
    }
}
