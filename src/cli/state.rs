//! Club state file.
//!
//! Each CLI invocation restores an engine from the CBOR state file, runs one
//! operation, and writes the resulting snapshot back. The write goes to a
//! sibling temp file first and is renamed into place.
//!
//! Three siblings share the state file's name:
//! - `<state>.tmp`: snapshot being written
//! - `<state>.lock`: held exclusively by a command from load through save
//! - `<state>.ledger`: settled transfer journal, see [`LedgerTransferClient`]

use super::config::LedgerConfig;
use fs4::fs_std::FileExt;
use safeclub::config::GovernanceConfig;
use safeclub::governance::{EngineSnapshot, GovernanceEngine, SystemClock};
use safeclub::retry::{retry_with_backoff, RetryPolicy};
use safeclub::transfer::LedgerTransferClient;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// State lock errors
#[derive(Debug, thiserror::Error)]
pub enum StateLockError {
    #[error("state file '{path}' is in use by another safeclub command; try again")]
    Busy { path: PathBuf },

    #[error("failed to lock '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StateLockError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy { .. })
    }
}

/// Exclusive hold on a club's state file across processes.
///
/// Released when dropped.
#[derive(Debug)]
pub struct StateLock {
    _file: File,
}

impl StateLock {
    /// Take the lock beside `state_path`, retrying with backoff while another
    /// process holds it.
    pub async fn acquire(
        state_path: &Path,
        config: &LedgerConfig,
    ) -> Result<Self, StateLockError> {
        let path = sibling(state_path, "lock");
        let io_error = |source| StateLockError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(io_error)?;

        let base = Duration::from_millis(config.lock_retry_backoff_ms);
        let policy = RetryPolicy {
            max_retries: config.lock_retries,
            base_delay: base,
            max_delay: base.saturating_mul(16),
        };
        let (held, at) = (&file, path.as_path());
        retry_with_backoff(
            &policy,
            || async move { try_lock(held, at) },
            StateLockError::is_retryable,
        )
        .await?;

        debug!(path = %path.display(), "state lock acquired");
        Ok(Self { _file: file })
    }
}

fn try_lock(file: &File, path: &Path) -> Result<(), StateLockError> {
    match file.try_lock_exclusive() {
        Ok(()) => Ok(()),
        Err(e) if e.raw_os_error() == fs4::lock_contended_error().raw_os_error() => {
            Err(StateLockError::Busy {
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(StateLockError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Read the state file at `path` and rebuild the engine.
///
/// Transfers go through the ledger journal beside the state file, so a
/// proposal paid by a run whose save failed is not paid again.
pub fn load_engine(
    path: &Path,
    config: &GovernanceConfig,
) -> Result<GovernanceEngine, Box<dyn std::error::Error>> {
    let bytes = fs::read(path).map_err(|e| {
        format!(
            "Failed to read state file '{}': {} (run `safeclub init` first)",
            path.display(),
            e
        )
    })?;
    let snapshot = EngineSnapshot::from_bytes(&bytes)
        .map_err(|e| format!("Failed to decode state file '{}': {}", path.display(), e))?;

    let journal = ledger_path(path);
    let ledger = LedgerTransferClient::open(&journal).map_err(|e| {
        format!(
            "Failed to read ledger journal '{}': {}",
            journal.display(),
            e
        )
    })?;
    let engine = GovernanceEngine::restore(
        snapshot,
        config.clone(),
        Arc::new(ledger),
        Arc::new(SystemClock),
    )?;

    debug!(path = %path.display(), "state loaded");
    Ok(engine)
}

/// Write the engine's snapshot to `path`.
pub async fn save_engine(
    engine: &GovernanceEngine,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = engine.snapshot().await?.to_bytes()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create state directory: {}", e))?;
    }

    let tmp = sibling(path, "tmp");
    fs::write(&tmp, bytes)
        .map_err(|e| format!("Failed to write state file '{}': {}", tmp.display(), e))?;
    fs::rename(&tmp, path)
        .map_err(|e| format!("Failed to replace state file '{}': {}", path.display(), e))?;

    debug!(path = %path.display(), "state saved");
    Ok(())
}

/// The settled transfer journal kept beside the state file at `path`.
pub fn ledger_path(path: &Path) -> PathBuf {
    sibling(path, "ledger")
}

fn sibling(path: &Path, extension: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(extension);
    path.with_file_name(name)
}
