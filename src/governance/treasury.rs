//! Treasury: the pooled balance and the record of what it paid out.
//!
//! A withdrawal calls the external transfer capability first and only debits
//! the balance once the transfer reports success, so a failed transfer leaves
//! the treasury exactly as it was.

use crate::identity::MemberId;
use crate::transfer::{TransferClient, TransferError, TransferRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Treasury errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreasuryError {
    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("deposit of {amount} would overflow balance {balance}")]
    Overflow { balance: u64, amount: u64 },

    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: u64, available: u64 },

    #[error(transparent)]
    Transfer(#[from] TransferError),
}

/// Treasury result type.
pub type TreasuryResult<T> = Result<T, TreasuryError>;

/// A completed payout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disbursement {
    pub proposal_id: u64,
    pub recipient: MemberId,
    pub amount: u64,
    /// Unix seconds.
    pub executed_at: u64,
}

/// Pooled funds.
pub struct Treasury {
    balance: u64,
    disbursements: Vec<Disbursement>,
    transfer: Arc<dyn TransferClient>,
}

impl Treasury {
    /// Empty treasury paying out through `transfer`.
    pub fn new(transfer: Arc<dyn TransferClient>) -> Self {
        Self::from_parts(0, Vec::new(), transfer)
    }

    /// Rebuild a treasury from persisted state.
    pub fn from_parts(
        balance: u64,
        disbursements: Vec<Disbursement>,
        transfer: Arc<dyn TransferClient>,
    ) -> Self {
        Self {
            balance,
            disbursements,
            transfer,
        }
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn disbursements(&self) -> &[Disbursement] {
        &self.disbursements
    }

    /// Add funds. Returns the new balance.
    pub fn deposit(&mut self, amount: u64) -> TreasuryResult<u64> {
        if amount == 0 {
            return Err(TreasuryError::ZeroAmount);
        }
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(TreasuryError::Overflow {
                balance: self.balance,
                amount,
            })?;
        Ok(self.balance)
    }

    /// Pay `amount` to `recipient` on behalf of proposal `proposal_id`.
    ///
    /// The balance is checked before the transfer is issued and debited only
    /// after it succeeds.
    pub async fn withdraw(
        &mut self,
        proposal_id: u64,
        amount: u64,
        recipient: MemberId,
        now: u64,
    ) -> TreasuryResult<()> {
        if amount == 0 {
            return Err(TreasuryError::ZeroAmount);
        }
        if amount > self.balance {
            return Err(TreasuryError::InsufficientFunds {
                requested: amount,
                available: self.balance,
            });
        }

        let request = TransferRequest {
            reference: proposal_id,
            recipient,
            amount,
        };
        self.transfer.transfer(&request).await?;

        // Checked above while holding &mut self; cannot underflow.
        self.balance -= amount;
        self.disbursements.push(Disbursement {
            proposal_id,
            recipient,
            amount,
            executed_at: now,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::MockTransferClient;

    fn treasury_with(balance: u64) -> (Treasury, MockTransferClient) {
        let mock = MockTransferClient::new();
        let mut treasury = Treasury::new(Arc::new(mock.clone()));
        if balance > 0 {
            treasury.deposit(balance).unwrap();
        }
        (treasury, mock)
    }

    #[test]
    fn test_deposit_increases_balance() {
        let (mut treasury, _) = treasury_with(0);
        assert_eq!(treasury.deposit(40).unwrap(), 40);
        assert_eq!(treasury.deposit(60).unwrap(), 100);
    }

    #[test]
    fn test_zero_deposit_rejected() {
        let (mut treasury, _) = treasury_with(0);
        assert_eq!(treasury.deposit(0), Err(TreasuryError::ZeroAmount));
    }

    #[test]
    fn test_deposit_overflow_rejected() {
        let (mut treasury, _) = treasury_with(u64::MAX);
        assert!(matches!(
            treasury.deposit(1),
            Err(TreasuryError::Overflow { .. })
        ));
        assert_eq!(treasury.balance(), u64::MAX);
    }

    #[tokio::test]
    async fn test_withdraw_debits_and_records() {
        let (mut treasury, mock) = treasury_with(100);
        let recipient = MemberId::from_name("r");

        treasury.withdraw(0, 70, recipient, 500).await.unwrap();

        assert_eq!(treasury.balance(), 30);
        assert_eq!(mock.completed().len(), 1);
        assert_eq!(
            treasury.disbursements(),
            &[Disbursement {
                proposal_id: 0,
                recipient,
                amount: 70,
                executed_at: 500,
            }]
        );
    }

    #[tokio::test]
    async fn test_withdraw_insufficient_funds_skips_transfer() {
        let (mut treasury, mock) = treasury_with(50);

        let result = treasury
            .withdraw(0, 100, MemberId::from_name("r"), 0)
            .await;

        assert_eq!(
            result,
            Err(TreasuryError::InsufficientFunds {
                requested: 100,
                available: 50
            })
        );
        assert_eq!(mock.call_count(), 0);
        assert_eq!(treasury.balance(), 50);
    }

    #[tokio::test]
    async fn test_failed_transfer_leaves_balance() {
        let (mut treasury, mock) = treasury_with(100);
        mock.fail_next(TransferError::Rejected("frozen".to_string()));

        let result = treasury.withdraw(3, 100, MemberId::from_name("r"), 0).await;

        assert!(matches!(result, Err(TreasuryError::Transfer(_))));
        assert_eq!(treasury.balance(), 100);
        assert!(treasury.disbursements().is_empty());
    }
}
