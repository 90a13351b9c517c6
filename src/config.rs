//! Governance parameters.
//!
//! These are fixed when the engine is built. Every field has a serde default
//! so a config file only needs to name what it changes.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How quorum and vote eligibility relate to membership over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuorumPolicy {
    /// Any current member may vote before the deadline; quorum is computed
    /// from the member count at finalize time.
    #[default]
    Live,
    /// Only members at proposal creation may vote; quorum is computed from
    /// that frozen set.
    Snapshot,
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Maximum proposal description length, in characters.
    #[serde(default = "default_max_description_len")]
    pub max_description_len: usize,

    /// Shortest accepted voting window.
    #[serde(default = "default_min_voting_window_secs")]
    pub min_voting_window_secs: u32,

    /// Longest accepted voting window.
    #[serde(default = "default_max_voting_window_secs")]
    pub max_voting_window_secs: u32,

    /// Window used by the CLI when `--window` is omitted.
    #[serde(default = "default_voting_window_secs")]
    pub default_voting_window_secs: u32,

    /// Upper bound on a single lock acquisition attempt.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,

    /// Extra acquisition attempts before surfacing `ConcurrencyTimeout`.
    #[serde(default = "default_lock_retries")]
    pub lock_retries: u32,

    /// Base delay between acquisition attempts (doubles each attempt).
    #[serde(default = "default_lock_retry_backoff_ms")]
    pub lock_retry_backoff_ms: u64,

    #[serde(default)]
    pub quorum_policy: QuorumPolicy,

    /// Broadcast buffer for governance events.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_max_description_len() -> usize {
    280
}

fn default_min_voting_window_secs() -> u32 {
    1
}

fn default_max_voting_window_secs() -> u32 {
    2_592_000 // 30 days
}

fn default_voting_window_secs() -> u32 {
    300 // 5 minutes
}

fn default_lock_timeout_ms() -> u64 {
    2_000
}

fn default_lock_retries() -> u32 {
    3
}

fn default_lock_retry_backoff_ms() -> u64 {
    25
}

fn default_event_capacity() -> usize {
    1024
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            max_description_len: default_max_description_len(),
            min_voting_window_secs: default_min_voting_window_secs(),
            max_voting_window_secs: default_max_voting_window_secs(),
            default_voting_window_secs: default_voting_window_secs(),
            lock_timeout_ms: default_lock_timeout_ms(),
            lock_retries: default_lock_retries(),
            lock_retry_backoff_ms: default_lock_retry_backoff_ms(),
            quorum_policy: QuorumPolicy::default(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl GovernanceConfig {
    /// Lock acquisition timeout as a Duration.
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// Base lock retry backoff as a Duration.
    pub fn lock_retry_backoff(&self) -> Duration {
        Duration::from_millis(self.lock_retry_backoff_ms)
    }

    /// Whether `window_secs` lies inside the configured bounds.
    pub fn accepts_voting_window(&self, window_secs: u32) -> bool {
        (self.min_voting_window_secs..=self.max_voting_window_secs).contains(&window_secs)
    }
}
