//! Governance core for the membership-gated treasury.
//!
//! Members propose payouts, vote on them, and execute the ones that pass.
//! [`GovernanceEngine`] is the only entry point the boundary layer needs;
//! the component modules are public for tests and tooling.

pub mod clock;
pub mod engine;
pub mod error;
pub mod events;
pub mod lock;
pub mod membership;
pub mod proposal;
pub mod snapshot;
pub mod store;
pub mod treasury;

#[cfg(test)]
mod proptests;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::GovernanceEngine;
pub use error::{GovernanceError, GovernanceResult, Resource};
pub use events::{EventBus, GovernanceEvent};
pub use lock::LockPolicy;
pub use membership::{MembershipError, MembershipRegistry, MembershipResult};
pub use proposal::{
    quorum, Proposal, ProposalError, ProposalId, ProposalResult, ProposalState, ProposalView,
};
pub use snapshot::{EngineSnapshot, SnapshotError, SNAPSHOT_VERSION};
pub use store::ProposalStore;
pub use treasury::{Disbursement, Treasury, TreasuryError, TreasuryResult};
