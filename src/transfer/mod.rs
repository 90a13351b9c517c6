//! External fund-movement capability.
//!
//! - `traits`: the [`TransferClient`] seam consumed by the treasury
//! - `mock`: recording client for tests
//! - `ledger`: logging client used by the operator CLI

pub mod ledger;
pub mod mock;
pub mod traits;

pub use ledger::LedgerTransferClient;
pub use mock::MockTransferClient;
pub use traits::{TransferClient, TransferError, TransferRequest, TransferResult};
