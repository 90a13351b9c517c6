//! Proposal table.
//!
//! Each proposal sits behind its own mutex so that votes on different
//! proposals never contend. The table itself is a short-lived read/write
//! lock that only guards id allocation and lookup; it is always released
//! before a proposal lock is awaited.

use super::error::{GovernanceError, GovernanceResult, Resource};
use super::lock::LockPolicy;
use super::proposal::{Proposal, ProposalId};
use std::collections::BTreeMap;
use std::ops::{Bound, RangeBounds};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

/// Shared handle to one proposal.
pub type ProposalHandle = Arc<Mutex<Proposal>>;

struct Table {
    next_id: ProposalId,
    entries: BTreeMap<ProposalId, ProposalHandle>,
}

/// Authoritative store of proposals and the id counter.
pub struct ProposalStore {
    table: RwLock<Table>,
    locks: LockPolicy,
}

impl ProposalStore {
    pub fn new(locks: LockPolicy) -> Self {
        Self::from_parts(0, Vec::new(), locks)
    }

    /// Rebuild a store from persisted proposals.
    pub fn from_parts(
        next_id: ProposalId,
        proposals: impl IntoIterator<Item = Proposal>,
        locks: LockPolicy,
    ) -> Self {
        let entries = proposals
            .into_iter()
            .map(|p| (p.id, Arc::new(Mutex::new(p))))
            .collect();
        Self {
            table: RwLock::new(Table { next_id, entries }),
            locks,
        }
    }

    /// Allocate the next id and insert the proposal `build` returns for it.
    ///
    /// Allocation and insertion happen under one table write lock, so ids
    /// are unique and appear in creation order.
    pub async fn insert_with<F>(&self, build: F) -> GovernanceResult<ProposalId>
    where
        F: FnOnce(ProposalId) -> Proposal,
    {
        let mut table = self
            .locks
            .acquire(Resource::ProposalTable, || self.table.write())
            .await?;

        let id = table.next_id;
        let proposal = build(id);
        debug_assert_eq!(proposal.id, id);
        table.entries.insert(id, Arc::new(Mutex::new(proposal)));
        table.next_id += 1;
        Ok(id)
    }

    /// Look up a proposal handle.
    pub async fn get(&self, id: ProposalId) -> GovernanceResult<ProposalHandle> {
        let table = self
            .locks
            .acquire(Resource::ProposalTable, || self.table.read())
            .await?;
        table
            .entries
            .get(&id)
            .cloned()
            .ok_or(GovernanceError::NotFound(id))
    }

    /// Lock a proposal for the duration of a critical section.
    pub async fn lock(&self, id: ProposalId) -> GovernanceResult<OwnedMutexGuard<Proposal>> {
        let handle = self.get(id).await?;
        self.locks
            .acquire(Resource::Proposal(id), || handle.clone().lock_owned())
            .await
    }

    /// Handles for every id in `range`, in id order. An inverted range is
    /// empty.
    pub async fn handles_in<R>(
        &self,
        range: R,
    ) -> GovernanceResult<Vec<(ProposalId, ProposalHandle)>>
    where
        R: RangeBounds<ProposalId>,
    {
        if is_inverted(&range) {
            return Ok(Vec::new());
        }
        let table = self
            .locks
            .acquire(Resource::ProposalTable, || self.table.read())
            .await?;
        Ok(table
            .entries
            .range(range)
            .map(|(id, handle)| (*id, handle.clone()))
            .collect())
    }

    /// The id the next proposal will receive.
    pub async fn next_id(&self) -> GovernanceResult<ProposalId> {
        let table = self
            .locks
            .acquire(Resource::ProposalTable, || self.table.read())
            .await?;
        Ok(table.next_id)
    }

    /// Next id and all handles in id order, read together.
    pub async fn contents(
        &self,
    ) -> GovernanceResult<(ProposalId, Vec<(ProposalId, ProposalHandle)>)> {
        let table = self
            .locks
            .acquire(Resource::ProposalTable, || self.table.read())
            .await?;
        let handles = table
            .entries
            .iter()
            .map(|(id, handle)| (*id, handle.clone()))
            .collect();
        Ok((table.next_id, handles))
    }
}

/// Ranges `BTreeMap::range` would panic on.
fn is_inverted<R: RangeBounds<ProposalId>>(range: &R) -> bool {
    match (range.start_bound(), range.end_bound()) {
        (Bound::Excluded(start), Bound::Excluded(end)) => start >= end,
        (
            Bound::Included(start) | Bound::Excluded(start),
            Bound::Included(end) | Bound::Excluded(end),
        ) => start > end,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GovernanceConfig;
    use crate::governance::proposal::ProposalTerms;
    use crate::identity::MemberId;

    fn store() -> ProposalStore {
        ProposalStore::new(LockPolicy::from_config(&GovernanceConfig::default()))
    }

    fn build(id: ProposalId) -> Proposal {
        let terms = ProposalTerms {
            recipient: MemberId::new([2; 32]),
            amount: 10,
            description: String::new(),
            voting_window_secs: 60,
        };
        Proposal::open(id, MemberId::new([1; 32]), terms, 0, None)
    }

    #[tokio::test]
    async fn test_ids_are_sequential_from_zero() {
        let store = store();
        assert_eq!(store.insert_with(build).await.unwrap(), 0);
        assert_eq!(store.insert_with(build).await.unwrap(), 1);
        assert_eq!(store.insert_with(build).await.unwrap(), 2);
        assert_eq!(store.next_id().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_unknown_id_not_found() {
        let store = store();
        assert_eq!(
            store.get(7).await.err(),
            Some(GovernanceError::NotFound(7))
        );
    }

    #[tokio::test]
    async fn test_handles_in_range() {
        let store = store();
        for _ in 0..5 {
            store.insert_with(build).await.unwrap();
        }

        let handles = store.handles_in(1..3).await.unwrap();
        let mut ids = Vec::new();
        for (id, handle) in handles {
            assert_eq!(handle.lock().await.id, id);
            ids.push(id);
        }
        assert_eq!(ids, vec![1, 2]);

        // Ranges past the counter are simply empty
        assert!(store.handles_in(10..20).await.unwrap().is_empty());
        #[allow(clippy::reversed_empty_ranges)]
        let inverted = 4..1;
        assert!(store.handles_in(inverted).await.unwrap().is_empty());
        assert_eq!(store.handles_in(3..).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_from_parts_keeps_counter() {
        let store = ProposalStore::from_parts(
            4,
            vec![build(0), build(3)],
            LockPolicy::from_config(&GovernanceConfig::default()),
        );
        assert_eq!(store.next_id().await.unwrap(), 4);
        assert!(store.get(3).await.is_ok());
        assert_eq!(store.insert_with(build).await.unwrap(), 4);
    }
}
