//! Property-based tests for governance invariants
//!
//! Tests for:
//! - Membership: no duplicates, isMember reflects exactly the admitted set
//! - Voting: voter count bounded by membership, no identity counted twice
//! - Finalize: idempotent, decision matches the majority-and-quorum rule

use super::membership::MembershipRegistry;
use super::proposal::{quorum, Proposal, ProposalState, ProposalTerms};
use crate::identity::MemberId;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn member(n: u8) -> MemberId {
    MemberId::new([n; 32])
}

fn open_proposal(window: u32) -> Proposal {
    let terms = ProposalTerms {
        recipient: member(255),
        amount: 1,
        description: String::new(),
        voting_window_secs: window,
    };
    Proposal::open(0, member(0), terms, 1_000, None)
}

// ============================================================================
// MEMBERSHIP PROPERTY TESTS
// ============================================================================

proptest! {
    /// Property: registry is exactly the founder plus every admitted identity
    #[test]
    fn registry_matches_admitted_set(candidates in prop::collection::vec(any::<u8>(), 0..64)) {
        let founder = member(0);
        let mut registry = MembershipRegistry::with_founder(founder);
        let mut expected = BTreeSet::from([founder]);

        for n in candidates {
            let candidate = member(n);
            let result = registry.add_member(&founder, candidate);
            prop_assert_eq!(result.is_ok(), expected.insert(candidate));
        }

        prop_assert_eq!(registry.member_count(), expected.len());
        prop_assert_eq!(registry.to_set(), expected.clone());
        for n in 0..=u8::MAX {
            prop_assert_eq!(registry.is_member(&member(n)), expected.contains(&member(n)));
        }
    }

    /// Property: a non-member can never admit anyone
    #[test]
    fn non_member_cannot_admit(outsider in 1u8..=u8::MAX, candidate in any::<u8>()) {
        let mut registry = MembershipRegistry::with_founder(member(0));
        prop_assert!(registry.add_member(&member(outsider), member(candidate)).is_err());
        prop_assert_eq!(registry.member_count(), 1);
    }
}

// ============================================================================
// VOTING PROPERTY TESTS
// ============================================================================

proptest! {
    /// Property: voters never exceed the membership and tally equals voters
    #[test]
    fn voters_bounded_by_membership(
        member_count in 1u8..32,
        ballots in prop::collection::vec((any::<u8>(), any::<bool>()), 0..128),
    ) {
        let members: BTreeSet<_> = (0..member_count).map(member).collect();
        let mut proposal = open_proposal(300);

        for (n, support) in ballots {
            let voter = member(n);
            // The engine only lets members through to the proposal.
            if members.contains(&voter) {
                let _ = proposal.record_vote(voter, support, 1_100);
            }
        }

        prop_assert!(proposal.voters.len() <= members.len());
        prop_assert!(proposal.voters.is_subset(&members));
        prop_assert_eq!(
            proposal.yes_votes + proposal.no_votes,
            proposal.voters.len() as u64
        );
    }
}

// ============================================================================
// FINALIZE PROPERTY TESTS
// ============================================================================

proptest! {
    /// Property: finalize is idempotent and follows the decision rule
    #[test]
    fn finalize_is_idempotent(
        member_count in 1usize..40,
        yes in 0usize..40,
        no in 0usize..40,
        extra_calls in 1usize..5,
        later_count in 1usize..80,
    ) {
        let yes = yes.min(member_count);
        let no = no.min(member_count - yes);

        let mut proposal = open_proposal(60);
        for i in 0..yes {
            proposal.record_vote(member(i as u8), true, 1_010).unwrap();
        }
        for i in yes..yes + no {
            proposal.record_vote(member(i as u8), false, 1_010).unwrap();
        }

        let first = proposal.finalize(1_060, member_count);
        let expected = if yes > no && yes as u64 >= quorum(member_count) {
            ProposalState::Passed
        } else {
            ProposalState::Rejected
        };
        prop_assert_eq!(first, expected);

        let decided = proposal.clone();
        for _ in 0..extra_calls {
            // Membership may have changed since; the decision must not.
            prop_assert_eq!(proposal.finalize(2_000, later_count), first);
        }
        prop_assert_eq!(proposal, decided);
    }

    /// Property: finalize before the deadline never decides
    #[test]
    fn finalize_before_deadline_stays_open(window in 1u32..10_000, offset in any::<u32>()) {
        let mut proposal = open_proposal(window);
        let now = 1_000 + u64::from(offset % window);
        prop_assert_eq!(proposal.finalize(now, 1), ProposalState::Open);
    }
}
