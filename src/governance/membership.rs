//! Membership registry.
//!
//! A flat set of identities: one member, one vote. The founder is the first
//! member and every later member is admitted by an existing one. Members are
//! never removed.

use crate::identity::MemberId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Membership errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MembershipError {
    #[error("{0:?} is not a member")]
    Unauthorized(MemberId),

    #[error("{0:?} is already a member")]
    AlreadyMember(MemberId),
}

/// Membership result type.
pub type MembershipResult<T> = Result<T, MembershipError>;

/// The set of authorized members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipRegistry {
    founder: MemberId,
    members: BTreeSet<MemberId>,
}

impl MembershipRegistry {
    /// Bootstrap a registry whose only member is `founder`.
    pub fn with_founder(founder: MemberId) -> Self {
        Self {
            founder,
            members: BTreeSet::from([founder]),
        }
    }

    /// Rebuild a registry from persisted state. The founder is always kept.
    pub fn from_parts(founder: MemberId, members: impl IntoIterator<Item = MemberId>) -> Self {
        let mut members: BTreeSet<_> = members.into_iter().collect();
        members.insert(founder);
        Self { founder, members }
    }

    /// Admit `new_member` on behalf of `caller`.
    pub fn add_member(&mut self, caller: &MemberId, new_member: MemberId) -> MembershipResult<()> {
        if !self.is_member(caller) {
            return Err(MembershipError::Unauthorized(*caller));
        }
        if !self.members.insert(new_member) {
            return Err(MembershipError::AlreadyMember(new_member));
        }
        Ok(())
    }

    pub fn is_member(&self, id: &MemberId) -> bool {
        self.members.contains(id)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn founder(&self) -> &MemberId {
        &self.founder
    }

    /// Members in identity order.
    pub fn members(&self) -> impl Iterator<Item = &MemberId> {
        self.members.iter()
    }

    /// Copy of the current member set, used to freeze eligibility.
    pub fn to_set(&self) -> BTreeSet<MemberId> {
        self.members.clone()
    }
}
