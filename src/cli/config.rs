//! SafeClub operator configuration file handling
//!
//! Provides default configuration generation and loading for the `safeclub`
//! CLI. Configuration files are TOML and live under the platform data
//! directory next to the state file unless `--config` says otherwise.
//!
//! ## Operator vs club state
//!
//! The operator file holds engine tuning (lock timeouts, description limit,
//! voting window bounds, quorum policy), the state file location and
//! logging. Members, balances and proposals live only in the state file and
//! change only through governance operations.

use safeclub::config::GovernanceConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default log level
const DEFAULT_LOG_LEVEL: &str = "info";

/// Directory name under the platform data directory.
const APP_DIR: &str = "safeclub";

/// Operator configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SafeClubConfig {
    /// Engine tuning
    #[serde(default)]
    pub governance: GovernanceConfig,

    /// Where club state is persisted
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// State file configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Path to the CBOR state file
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,

    /// Attempts to take the state lock after the first one
    #[serde(default = "default_lock_retries")]
    pub lock_retries: u32,

    /// Delay before the first lock retry; doubles up to 16x
    #[serde(default = "default_lock_retry_backoff_ms")]
    pub lock_retry_backoff_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_lock_retries() -> u32 {
    50
}

fn default_lock_retry_backoff_ms() -> u64 {
    10
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
            lock_retries: default_lock_retries(),
            lock_retry_backoff_ms: default_lock_retry_backoff_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: None,
        }
    }
}

impl SafeClubConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: SafeClubConfig = toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;

        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Generate default configuration content as a string with comments
    pub fn generate_default_toml(state_path: &Path) -> String {
        format!(
            r#"# SafeClub Operator Configuration
#
# Engine tuning and file locations. Club membership, the treasury balance
# and proposals are NOT configured here; they change only through
# governance commands (add-member, deposit, propose, vote, execute).

[governance]
# Maximum proposal description length, in characters
max_description_len = 280

# Allowed voting window, in seconds (1 second to 30 days)
min_voting_window_secs = 1
max_voting_window_secs = 2592000

# Window used by `propose` when --window is not given
default_voting_window_secs = 300

# Lock acquisition: timeout per attempt, retries, base backoff
lock_timeout_ms = 2000
lock_retries = 3
lock_retry_backoff_ms = 25

# Quorum base: "live" counts members at finalize time,
# "snapshot" freezes the electorate when the proposal is created
quorum_policy = "live"

# Buffered events per subscriber
event_capacity = 1024

[ledger]
# Path to the CBOR state file
state_path = "{state_path}"

# Commands that change the club hold an exclusive lock on a sibling
# ".lock" file. Retries and base backoff while another command holds it.
lock_retries = 50
lock_retry_backoff_ms = 10

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log file path (optional, logs to stderr if not specified)
# file = "/var/log/safeclub/safeclub.log"
"#,
            state_path = state_path.display()
        )
    }

    /// Create and save a default configuration file
    pub fn create_default(
        config_path: &Path,
        state_path: &Path,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let contents = Self::generate_default_toml(state_path);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        fs::write(config_path, contents).map_err(|e| {
            format!(
                "Failed to write config file '{}': {}",
                config_path.display(),
                e
            )
        })?;

        Ok(())
    }
}

/// Default data directory: `<data_dir>/safeclub`
fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Get the default config file path
///
/// - Config: ~/.local/share/safeclub/config.toml
pub fn default_config_path() -> PathBuf {
    default_data_dir().join("config.toml")
}

/// Get the default state file path
///
/// - State: ~/.local/share/safeclub/state.cbor
pub fn default_state_path() -> PathBuf {
    default_data_dir().join("state.cbor")
}

#[cfg(test)]
mod tests {
    use super::*;
    use safeclub::config::QuorumPolicy;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = SafeClubConfig::default();

        assert_eq!(config.ledger.state_path, default_state_path());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.governance.max_description_len, 280);
    }

    #[test]
    fn test_serialized_config_loads_back() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let mut config = SafeClubConfig::default();
        config.ledger.state_path = temp_dir.path().join("club.cbor");
        config.governance.quorum_policy = QuorumPolicy::Snapshot;
        fs::write(&config_path, toml::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = SafeClubConfig::load(&config_path).unwrap();
        assert_eq!(loaded.ledger.state_path, temp_dir.path().join("club.cbor"));
        assert_eq!(loaded.governance.quorum_policy, QuorumPolicy::Snapshot);
    }

    #[test]
    fn test_create_default_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let state_path = temp_dir.path().join("state.cbor");

        SafeClubConfig::create_default(&config_path, &state_path).unwrap();

        assert!(config_path.exists());

        // The commented template must parse back
        let config = SafeClubConfig::load(&config_path).unwrap();
        assert_eq!(config.ledger.state_path, state_path);
        assert_eq!(config.ledger.lock_retries, default_lock_retries());
        assert_eq!(config.governance, GovernanceConfig::default());
    }

    #[test]
    fn test_default_paths_share_directory() {
        assert_eq!(default_config_path().parent(), default_state_path().parent());
        assert!(default_state_path().ends_with("safeclub/state.cbor"));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = SafeClubConfig::load_or_default(&temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_config_with_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let minimal_config = r#"
[governance]
lock_timeout_ms = 50
"#;
        fs::write(&config_path, minimal_config).unwrap();

        let config = SafeClubConfig::load(&config_path).unwrap();

        assert_eq!(config.governance.lock_timeout_ms, 50);
        assert_eq!(config.governance.max_description_len, 280);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.ledger.state_path, default_state_path());
    }

    #[test]
    fn test_malformed_config_reports_path() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "[governance\n").unwrap();

        let err = SafeClubConfig::load(&config_path).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }
}
