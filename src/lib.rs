//! SafeClub - membership-gated treasury governance
//!
//! A club of members pools funds in a treasury. Any member may propose a
//! payout; members vote during a fixed window; a proposal with a majority
//! that also meets quorum can be executed exactly once.
//!
//! Key principles:
//! - One member, one vote, members are never removed
//! - Every mutation is serialized per resource with bounded lock waits
//! - Money moves only through the injected [`transfer::TransferClient`]
//! - Deadlines come from the injected [`governance::Clock`]

pub mod config;
pub mod governance;
pub mod identity;
pub mod retry;
pub mod serialization;
pub mod transfer;
