use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::scheduler::SchedulerConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub draft: DraftConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub events: EventsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Database configuration. One SQLite file holds drafts and events.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("snakedraft.db")
}

/// What to do when a draft starts with an odd number of participants.
///
/// Snake order is well defined for any count; the participant at either end
/// simply picks twice in a row at each turnaround. Leagues that want an even
/// field can reject odd counts instead.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OddParticipantPolicy {
    #[default]
    Allow,
    Reject,
}

/// Draft rules applied when starting sessions.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DraftConfig {
    /// Turn duration used when a start request omits one.
    #[serde(default = "default_turn_duration")]
    pub default_turn_duration_secs: u32,

    /// Shortest turn duration a start request may ask for.
    #[serde(default = "default_min_turn_duration")]
    pub min_turn_duration_secs: u32,

    #[serde(default = "default_max_participants")]
    pub max_participants: usize,

    #[serde(default)]
    pub odd_participant_policy: OddParticipantPolicy,
}

fn default_turn_duration() -> u32 {
    60
}

fn default_min_turn_duration() -> u32 {
    1
}

fn default_max_participants() -> usize {
    32
}

impl Default for DraftConfig {
    fn default() -> Self {
        Self {
            default_turn_duration_secs: default_turn_duration(),
            min_turn_duration_secs: default_min_turn_duration(),
            max_participants: default_max_participants(),
            odd_participant_policy: OddParticipantPolicy::default(),
        }
    }
}

/// Event pipeline configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EventsConfig {
    /// Capacity of the event channel.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

fn default_buffer_size() -> usize {
    1000
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
        }
    }
}
