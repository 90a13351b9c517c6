//! Point-in-time image of the whole engine.
//!
//! A snapshot is what the CLI writes to its state file between commands.
//! It is validated before an engine is rebuilt from it, so a hand-edited or
//! truncated file is rejected instead of silently breaking an invariant.

use super::proposal::{Proposal, ProposalId};
use super::treasury::Disbursement;
use crate::identity::MemberId;
use crate::serialization::{from_cbor, to_cbor, SerializationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Current on-disk schema version.
pub const SNAPSHOT_VERSION: u32 = 1;

fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

/// Snapshot errors.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot encoding failed: {0}")]
    Serialization(#[from] SerializationError),

    #[error("unsupported snapshot version {found} (this build reads up to {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("founder {0:?} is not in the member set")]
    FounderMissing(MemberId),

    #[error("proposal {id} is not below the next id {next_id}")]
    ProposalIdOutOfRange { id: ProposalId, next_id: ProposalId },

    #[error("proposal {0} appears more than once")]
    DuplicateProposal(ProposalId),

    #[error("{voter:?} voted on proposal {id} but is not a member")]
    UnknownVoter { id: ProposalId, voter: MemberId },

    #[error("proposal {id} tally {tally} does not match {voters} recorded voters")]
    TallyMismatch {
        id: ProposalId,
        tally: u64,
        voters: usize,
    },
}

/// Engine state as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    #[serde(default = "default_version")]
    pub version: u32,
    pub founder: MemberId,
    pub members: BTreeSet<MemberId>,
    pub balance: u64,
    #[serde(default)]
    pub disbursements: Vec<Disbursement>,
    pub next_proposal_id: ProposalId,
    /// In id order.
    #[serde(default)]
    pub proposals: Vec<Proposal>,
}

impl EngineSnapshot {
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(to_cbor(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        Ok(from_cbor(bytes)?)
    }

    /// Check the invariants an engine relies on.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.version > SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: self.version,
                supported: SNAPSHOT_VERSION,
            });
        }
        if !self.members.contains(&self.founder) {
            return Err(SnapshotError::FounderMissing(self.founder));
        }

        let mut seen = BTreeSet::new();
        for proposal in &self.proposals {
            let id = proposal.id;
            if id >= self.next_proposal_id {
                return Err(SnapshotError::ProposalIdOutOfRange {
                    id,
                    next_id: self.next_proposal_id,
                });
            }
            if !seen.insert(id) {
                return Err(SnapshotError::DuplicateProposal(id));
            }

            let electorate = proposal.eligible.as_ref().unwrap_or(&self.members);
            if let Some(voter) = proposal
                .voters
                .iter()
                .find(|voter| !self.members.contains(voter) || !electorate.contains(voter))
            {
                return Err(SnapshotError::UnknownVoter { id, voter: *voter });
            }

            let tally = proposal.yes_votes.saturating_add(proposal.no_votes);
            if tally != proposal.voters.len() as u64 {
                return Err(SnapshotError::TallyMismatch {
                    id,
                    tally,
                    voters: proposal.voters.len(),
                });
            }
        }
        Ok(())
    }
}
