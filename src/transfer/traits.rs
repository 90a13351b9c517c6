//! Trait abstraction for the external fund-movement mechanism.
//!
//! The governance core never moves money itself. Execution hands a
//! [`TransferRequest`] to a [`TransferClient`] and awaits a definitive answer
//! while holding the proposal and treasury locks.

use crate::identity::MemberId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single outbound transfer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Idempotency reference: the id of the proposal being executed.
    ///
    /// The same reference can arrive again after an interrupted execution.
    /// Identical terms must answer `Ok` without moving funds a second time;
    /// different terms under a settled reference are a `Duplicate`.
    pub reference: u64,
    pub recipient: MemberId,
    pub amount: u64,
}

/// Result type for transfer operations.
pub type TransferResult<T> = Result<T, TransferError>;

/// Transfer errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    /// The mechanism could not be reached. The transfer was not applied.
    #[error("transfer mechanism unavailable: {0}")]
    Unavailable(String),

    /// The mechanism refused the transfer.
    #[error("transfer rejected: {0}")]
    Rejected(String),

    /// The reference was already settled with different terms.
    #[error("duplicate transfer reference {0}")]
    Duplicate(u64),
}

/// External transfer capability.
///
/// Implementations must return only after the transfer is either applied
/// (`Ok`) or definitely not applied (`Err`). A provisional "submitted" state
/// is not representable here.
///
/// The future must be safe to cancel. A caller that drops an execution while
/// `transfer` is pending leaves the proposal `Passed`, and the retry carries
/// the same `reference`; deduplicating on it is what keeps that retry from
/// paying twice.
#[async_trait]
pub trait TransferClient: Send + Sync {
    /// Move `request.amount` to `request.recipient`.
    async fn transfer(&self, request: &TransferRequest) -> TransferResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_error_display() {
        assert_eq!(
            TransferError::Duplicate(7).to_string(),
            "duplicate transfer reference 7"
        );
        assert_eq!(
            TransferError::Unavailable("rpc down".to_string()).to_string(),
            "transfer mechanism unavailable: rpc down"
        );
    }

    #[test]
    fn test_request_serializes_as_json() {
        let request = TransferRequest {
            reference: 3,
            recipient: MemberId::new([9u8; 32]),
            amount: 250,
        };
        let json = serde_json::to_string(&request).unwrap();
        let back: TransferRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(request, back);
    }
}
