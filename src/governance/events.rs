//! Governance notifications.
//!
//! The engine emits events but never delivers them. Whoever sits at the
//! boundary subscribes and forwards them.
//!
//! Delivery is at-most-once and in memory only: a receiver that falls more
//! than `event_capacity` events behind gets `RecvError::Lagged`, and events
//! emitted with no subscriber are dropped.

use super::proposal::{ProposalId, ProposalState};
use crate::identity::MemberId;
use crate::transfer::TransferError;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

/// A state change worth telling the outside world about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GovernanceEvent {
    MemberAdded {
        added_by: MemberId,
        member: MemberId,
        at: u64,
    },
    ProposalCreated {
        id: ProposalId,
        proposer: MemberId,
        recipient: MemberId,
        amount: u64,
        voting_deadline: u64,
        at: u64,
    },
    VoteCast {
        id: ProposalId,
        voter: MemberId,
        support: bool,
        at: u64,
    },
    ProposalFinalized {
        id: ProposalId,
        state: ProposalState,
        yes_votes: u64,
        no_votes: u64,
        at: u64,
    },
    ProposalExecuted {
        id: ProposalId,
        recipient: MemberId,
        amount: u64,
        executed_by: MemberId,
        at: u64,
    },
    TransferFailed {
        id: ProposalId,
        reason: String,
        at: u64,
    },
    FundsDeposited {
        amount: u64,
        balance: u64,
        at: u64,
    },
}

impl GovernanceEvent {
    pub(crate) fn transfer_failed(id: ProposalId, error: &TransferError, at: u64) -> Self {
        Self::TransferFailed {
            id,
            reason: error.to_string(),
            at,
        }
    }

    /// Unix seconds at which the event was emitted.
    pub fn at(&self) -> u64 {
        match self {
            Self::MemberAdded { at, .. }
            | Self::ProposalCreated { at, .. }
            | Self::VoteCast { at, .. }
            | Self::ProposalFinalized { at, .. }
            | Self::ProposalExecuted { at, .. }
            | Self::TransferFailed { at, .. }
            | Self::FundsDeposited { at, .. } => *at,
        }
    }
}

/// Broadcast channel for [`GovernanceEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<GovernanceEvent>,
}

impl EventBus {
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Emit to all current subscribers. Returns how many received it.
    pub fn emit(&self, event: GovernanceEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Receive every event emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<GovernanceEvent> {
        self.sender.subscribe()
    }

    /// Same as [`subscribe`](Self::subscribe), as a `Stream`.
    pub fn stream(&self) -> BroadcastStream<GovernanceEvent> {
        BroadcastStream::new(self.subscribe())
    }
}
