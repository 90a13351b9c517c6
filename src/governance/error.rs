//! Error taxonomy returned by the governance engine.
//!
//! Component errors (membership, treasury, proposal) convert into
//! [`GovernanceError`] at the façade. Only `ConcurrencyTimeout` is retryable.

use super::membership::MembershipError;
use super::proposal::{ProposalError, ProposalId, ProposalState};
use super::treasury::TreasuryError;
use crate::identity::MemberId;
use crate::transfer::TransferError;
use std::fmt;

/// A lockable resource inside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Membership,
    ProposalTable,
    Proposal(ProposalId),
    Treasury,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Membership => write!(f, "membership registry"),
            Self::ProposalTable => write!(f, "proposal table"),
            Self::Proposal(id) => write!(f, "proposal {}", id),
            Self::Treasury => write!(f, "treasury"),
        }
    }
}

/// Result type for engine operations.
pub type GovernanceResult<T> = Result<T, GovernanceError>;

/// Engine errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GovernanceError {
    #[error("{0:?} lacks standing for this action")]
    Unauthorized(MemberId),

    #[error("proposal {0} not found")]
    NotFound(ProposalId),

    #[error("{0:?} is already a member")]
    AlreadyMember(MemberId),

    #[error("{voter:?} already voted on proposal {id}")]
    AlreadyVoted { id: ProposalId, voter: MemberId },

    #[error("proposal {0} was already executed")]
    AlreadyExecuted(ProposalId),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("description is {len} characters, limit is {max}")]
    InvalidDescription { len: usize, max: usize },

    #[error("voting window {window}s outside [{min}s, {max}s]")]
    InvalidVotingWindow { window: u32, min: u32, max: u32 },

    #[error("voting on proposal {0} is closed")]
    VotingClosed(ProposalId),

    #[error("proposal {id} is {state}, expected passed")]
    InvalidState { id: ProposalId, state: ProposalState },

    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: u64, available: u64 },

    #[error("transfer failed: {0}")]
    TransferFailed(TransferError),

    #[error("timed out acquiring {0}")]
    ConcurrencyTimeout(Resource),
}

impl GovernanceError {
    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyTimeout(_))
    }
}

impl From<MembershipError> for GovernanceError {
    fn from(err: MembershipError) -> Self {
        match err {
            MembershipError::Unauthorized(caller) => Self::Unauthorized(caller),
            MembershipError::AlreadyMember(member) => Self::AlreadyMember(member),
        }
    }
}

impl From<TreasuryError> for GovernanceError {
    fn from(err: TreasuryError) -> Self {
        match err {
            TreasuryError::ZeroAmount => Self::InvalidAmount("amount must be > 0".to_string()),
            TreasuryError::Overflow { balance, amount } => Self::InvalidAmount(format!(
                "deposit of {} would overflow balance {}",
                amount, balance
            )),
            TreasuryError::InsufficientFunds {
                requested,
                available,
            } => Self::InsufficientFunds {
                requested,
                available,
            },
            TreasuryError::Transfer(e) => Self::TransferFailed(e),
        }
    }
}

impl From<ProposalError> for GovernanceError {
    fn from(err: ProposalError) -> Self {
        match err {
            ProposalError::ZeroAmount => Self::InvalidAmount("amount must be > 0".to_string()),
            ProposalError::DescriptionTooLong { len, max } => {
                Self::InvalidDescription { len, max }
            }
            ProposalError::VotingWindowOutOfRange { window, min, max } => {
                Self::InvalidVotingWindow { window, min, max }
            }
            ProposalError::NotEligible { voter, .. } => Self::Unauthorized(voter),
            ProposalError::VotingClosed(id) => Self::VotingClosed(id),
            ProposalError::AlreadyVoted { id, voter } => Self::AlreadyVoted { id, voter },
            ProposalError::AlreadyExecuted(id) => Self::AlreadyExecuted(id),
            ProposalError::NotPassed { id, state } => Self::InvalidState { id, state },
        }
    }
}
