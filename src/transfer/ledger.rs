//! Local ledger transfer client used by the operator CLI.
//!
//! There is no real fund-movement backend behind the CLI. A credit is the
//! line appended to the journal file; it is synced to disk before `transfer`
//! returns, so a settled reference survives a state file that was never
//! written.

use super::traits::*;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

/// Transfer client backed by an append-only JSON-lines journal.
///
/// Without a journal (`Default`) settlements are kept in memory only.
#[derive(Default)]
pub struct LedgerTransferClient {
    journal: Option<PathBuf>,
    settled: Mutex<HashMap<u64, TransferRequest>>,
}

impl LedgerTransferClient {
    /// Open the journal at `path`, loading every reference it has settled.
    ///
    /// A missing journal is an empty ledger.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let settled = read_journal(&path)?;

        Ok(Self {
            journal: Some(path),
            settled: Mutex::new(settled),
        })
    }
}

fn read_journal(path: &Path) -> io::Result<HashMap<u64, TransferRequest>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(e) => return Err(e),
    };

    let mut settled = HashMap::new();
    for (n, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let request: TransferRequest = serde_json::from_str(line).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{} line {}: {}", path.display(), n + 1, e),
            )
        })?;
        settled.entry(request.reference).or_insert(request);
    }
    Ok(settled)
}

fn append_journal(path: &Path, request: &TransferRequest) -> io::Result<()> {
    let mut line = serde_json::to_string(request).map_err(io::Error::other)?;
    line.push('\n');

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())?;
    file.sync_data()
}

#[async_trait]
impl TransferClient for LedgerTransferClient {
    async fn transfer(&self, request: &TransferRequest) -> TransferResult<()> {
        let mut settled = self
            .settled
            .lock()
            .map_err(|_| TransferError::Unavailable("ledger lock poisoned".to_string()))?;

        if let Some(done) = settled.get(&request.reference) {
            if done != request {
                return Err(TransferError::Duplicate(request.reference));
            }
            info!(
                reference = request.reference,
                "ledger reference already settled, not credited again"
            );
            return Ok(());
        }

        if let Some(path) = &self.journal {
            append_journal(path, request).map_err(|e| {
                TransferError::Unavailable(format!(
                    "cannot write ledger journal '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        settled.insert(request.reference, request.clone());

        info!(
            reference = request.reference,
            recipient = %request.recipient,
            amount = request.amount,
            "ledger credit"
        );
        Ok(())
    }
}
