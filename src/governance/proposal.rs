//! Proposal records and their lifecycle.
//!
//! State only moves forward:
//!
//! ```text
//! Open ──(deadline, decide)──▶ Passed ──(execute)──▶ Executed
//!   └────────────────────────▶ Rejected
//! ```
//!
//! Every method here runs under the owning proposal's lock, so checks and
//! mutations inside one call are atomic with respect to other callers.

use crate::config::GovernanceConfig;
use crate::identity::MemberId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Proposal identifier, assigned in creation order starting at 0.
pub type ProposalId = u64;

/// Lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalState {
    Open,
    Passed,
    Rejected,
    Executed,
}

impl fmt::Display for ProposalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Open => "open",
            Self::Passed => "passed",
            Self::Rejected => "rejected",
            Self::Executed => "executed",
        };
        f.write_str(name)
    }
}

/// Proposal-level errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProposalError {
    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("description is {len} characters, limit is {max}")]
    DescriptionTooLong { len: usize, max: usize },

    #[error("voting window {window}s outside [{min}s, {max}s]")]
    VotingWindowOutOfRange { window: u32, min: u32, max: u32 },

    #[error("{voter:?} is not eligible to vote on proposal {id}")]
    NotEligible { id: ProposalId, voter: MemberId },

    #[error("voting on proposal {0} is closed")]
    VotingClosed(ProposalId),

    #[error("{voter:?} already voted on proposal {id}")]
    AlreadyVoted { id: ProposalId, voter: MemberId },

    #[error("proposal {0} was already executed")]
    AlreadyExecuted(ProposalId),

    #[error("proposal {id} is {state}, expected passed")]
    NotPassed { id: ProposalId, state: ProposalState },
}

/// Proposal result type.
pub type ProposalResult<T> = Result<T, ProposalError>;

/// Yes votes needed to pass: a majority of `member_count`, rounded up.
pub fn quorum(member_count: usize) -> u64 {
    (member_count as u64).div_ceil(2)
}

/// Validate the terms of a new proposal against `config`.
pub fn validate_terms(
    config: &GovernanceConfig,
    amount: u64,
    description: &str,
    voting_window_secs: u32,
) -> ProposalResult<()> {
    if amount == 0 {
        return Err(ProposalError::ZeroAmount);
    }

    let len = description.chars().count();
    if len > config.max_description_len {
        return Err(ProposalError::DescriptionTooLong {
            len,
            max: config.max_description_len,
        });
    }

    if !config.accepts_voting_window(voting_window_secs) {
        return Err(ProposalError::VotingWindowOutOfRange {
            window: voting_window_secs,
            min: config.min_voting_window_secs,
            max: config.max_voting_window_secs,
        });
    }

    Ok(())
}

/// Terms supplied by the proposer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalTerms {
    pub recipient: MemberId,
    pub amount: u64,
    pub description: String,
    pub voting_window_secs: u32,
}

/// A proposal to pay `amount` from the treasury to `recipient`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub proposer: MemberId,
    pub recipient: MemberId,
    pub amount: u64,
    pub description: String,
    /// Unix seconds.
    pub created_at: u64,
    /// Unix seconds; voting is closed at and after this instant.
    pub voting_deadline: u64,
    pub yes_votes: u64,
    pub no_votes: u64,
    pub voters: BTreeSet<MemberId>,
    /// Members frozen at creation under the snapshot quorum policy.
    #[serde(default)]
    pub eligible: Option<BTreeSet<MemberId>>,
    pub state: ProposalState,
}

impl Proposal {
    /// Open a new proposal. Terms must already be validated.
    pub fn open(
        id: ProposalId,
        proposer: MemberId,
        terms: ProposalTerms,
        created_at: u64,
        eligible: Option<BTreeSet<MemberId>>,
    ) -> Self {
        Self {
            id,
            proposer,
            recipient: terms.recipient,
            amount: terms.amount,
            description: terms.description,
            created_at,
            voting_deadline: created_at.saturating_add(u64::from(terms.voting_window_secs)),
            yes_votes: 0,
            no_votes: 0,
            voters: BTreeSet::new(),
            eligible,
            state: ProposalState::Open,
        }
    }

    /// Whether a vote at `now` would be accepted by the deadline rule.
    pub fn is_voting_open(&self, now: u64) -> bool {
        self.state == ProposalState::Open && now < self.voting_deadline
    }

    /// Whether `voter` is in the frozen eligible set (always true under the
    /// live policy; membership is checked by the caller).
    pub fn is_eligible(&self, voter: &MemberId) -> bool {
        self.eligible
            .as_ref()
            .map_or(true, |eligible| eligible.contains(voter))
    }

    /// Record a vote cast at `now`.
    ///
    /// The deadline is checked here, in the same critical section as the
    /// tally update.
    pub fn record_vote(&mut self, voter: MemberId, support: bool, now: u64) -> ProposalResult<()> {
        if !self.is_eligible(&voter) {
            return Err(ProposalError::NotEligible { id: self.id, voter });
        }
        if !self.is_voting_open(now) {
            return Err(ProposalError::VotingClosed(self.id));
        }
        if !self.voters.insert(voter) {
            return Err(ProposalError::AlreadyVoted { id: self.id, voter });
        }

        if support {
            self.yes_votes += 1;
        } else {
            self.no_votes += 1;
        }
        Ok(())
    }

    /// Member count quorum is computed against: the frozen set if there is
    /// one, otherwise `live_member_count`.
    pub fn quorum_base(&self, live_member_count: usize) -> usize {
        self.eligible
            .as_ref()
            .map_or(live_member_count, BTreeSet::len)
    }

    /// Apply the decision rule.
    ///
    /// No-op returning the current state if the proposal is no longer Open or
    /// the deadline has not been reached.
    pub fn finalize(&mut self, now: u64, live_member_count: usize) -> ProposalState {
        if self.state != ProposalState::Open || now < self.voting_deadline {
            return self.state;
        }

        let required = quorum(self.quorum_base(live_member_count));
        self.state = if self.yes_votes > self.no_votes && self.yes_votes >= required {
            ProposalState::Passed
        } else {
            ProposalState::Rejected
        };
        self.state
    }

    /// Check that the proposal can be executed now.
    pub fn ensure_executable(&self) -> ProposalResult<()> {
        match self.state {
            ProposalState::Passed => Ok(()),
            ProposalState::Executed => Err(ProposalError::AlreadyExecuted(self.id)),
            state => Err(ProposalError::NotPassed { id: self.id, state }),
        }
    }

    /// Passed → Executed. Called once the transfer has succeeded.
    pub fn mark_executed(&mut self) -> ProposalResult<()> {
        self.ensure_executable()?;
        self.state = ProposalState::Executed;
        Ok(())
    }

    /// Read-only view handed to the boundary layer.
    pub fn view(&self) -> ProposalView {
        ProposalView {
            id: self.id,
            proposer: self.proposer,
            recipient: self.recipient,
            amount: self.amount,
            description: self.description.clone(),
            yes_votes: self.yes_votes,
            no_votes: self.no_votes,
            state: self.state,
            created_at: self.created_at,
            voting_deadline: self.voting_deadline,
        }
    }
}

/// What callers see of a proposal. Voter identities are not exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalView {
    pub id: ProposalId,
    pub proposer: MemberId,
    pub recipient: MemberId,
    pub amount: u64,
    pub description: String,
    pub yes_votes: u64,
    pub no_votes: u64,
    pub state: ProposalState,
    pub created_at: u64,
    pub voting_deadline: u64,
}
