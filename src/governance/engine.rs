//! Governance engine façade.
//!
//! Owns the membership registry, the proposal store and the treasury, and
//! exposes the operations the boundary layer calls. Every operation takes
//! its locks through [`LockPolicy`] in the global order documented in
//! [`super::lock`], and translates component failures into
//! [`GovernanceError`].

use super::clock::Clock;
use super::error::{GovernanceError, GovernanceResult, Resource};
use super::events::{EventBus, GovernanceEvent};
use super::lock::LockPolicy;
use super::membership::MembershipRegistry;
use super::proposal::{
    validate_terms, Proposal, ProposalId, ProposalState, ProposalTerms, ProposalView,
};
use super::snapshot::{EngineSnapshot, SnapshotError, SNAPSHOT_VERSION};
use super::store::ProposalStore;
use super::treasury::{Treasury, TreasuryError};
use crate::config::{GovernanceConfig, QuorumPolicy};
use crate::identity::MemberId;
use crate::transfer::TransferClient;
use std::ops::RangeBounds;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, MutexGuard, RwLock, RwLockReadGuard};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};

/// The membership-gated treasury.
pub struct GovernanceEngine {
    config: GovernanceConfig,
    locks: LockPolicy,
    members: RwLock<MembershipRegistry>,
    proposals: ProposalStore,
    treasury: Mutex<Treasury>,
    clock: Arc<dyn Clock>,
    events: EventBus,
}

impl GovernanceEngine {
    /// A fresh engine whose only member is `founder` and whose treasury is
    /// empty.
    pub fn new(
        founder: MemberId,
        config: GovernanceConfig,
        transfer: Arc<dyn TransferClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let locks = LockPolicy::from_config(&config);
        Self {
            members: RwLock::new(MembershipRegistry::with_founder(founder)),
            proposals: ProposalStore::new(locks),
            treasury: Mutex::new(Treasury::new(transfer)),
            events: EventBus::with_capacity(config.event_capacity),
            locks,
            clock,
            config,
        }
    }

    /// Rebuild an engine from a validated snapshot.
    pub fn restore(
        snapshot: EngineSnapshot,
        config: GovernanceConfig,
        transfer: Arc<dyn TransferClient>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SnapshotError> {
        snapshot.validate()?;

        let locks = LockPolicy::from_config(&config);
        let registry = MembershipRegistry::from_parts(snapshot.founder, snapshot.members);
        let treasury = Treasury::from_parts(snapshot.balance, snapshot.disbursements, transfer);

        info!(
            members = registry.member_count(),
            proposals = snapshot.proposals.len(),
            balance = treasury.balance(),
            "engine restored"
        );

        Ok(Self {
            members: RwLock::new(registry),
            proposals: ProposalStore::from_parts(
                snapshot.next_proposal_id,
                snapshot.proposals,
                locks,
            ),
            treasury: Mutex::new(treasury),
            events: EventBus::with_capacity(config.event_capacity),
            locks,
            clock,
            config,
        })
    }

    /// Capture the whole engine.
    ///
    /// Holds every proposal lock (in id order), then the registry, then the
    /// treasury, so the image is consistent.
    pub async fn snapshot(&self) -> GovernanceResult<EngineSnapshot> {
        let (next_proposal_id, handles) = self.proposals.contents().await?;

        let mut guards = Vec::with_capacity(handles.len());
        for (id, handle) in handles {
            let guard = self
                .locks
                .acquire(Resource::Proposal(id), || handle.clone().lock_owned())
                .await?;
            guards.push(guard);
        }

        let members = self.read_members().await?;
        let treasury = self.lock_treasury().await?;

        Ok(EngineSnapshot {
            version: SNAPSHOT_VERSION,
            founder: *members.founder(),
            members: members.to_set(),
            balance: treasury.balance(),
            disbursements: treasury.disbursements().to_vec(),
            next_proposal_id,
            proposals: guards.iter().map(|guard| Proposal::clone(guard)).collect(),
        })
    }

    // ------------------------------------------------------------------
    // Membership
    // ------------------------------------------------------------------

    /// Admit `new_member` on behalf of the existing member `caller`.
    pub async fn add_member(
        &self,
        caller: &MemberId,
        new_member: MemberId,
    ) -> GovernanceResult<()> {
        let mut members = self
            .locks
            .acquire(Resource::Membership, || self.members.write())
            .await?;
        members.add_member(caller, new_member)?;
        let count = members.member_count();
        drop(members);

        info!(by = %caller.short(), member = %new_member.short(), count, "member added");
        self.events.emit(GovernanceEvent::MemberAdded {
            added_by: *caller,
            member: new_member,
            at: self.clock.now(),
        });
        Ok(())
    }

    pub async fn is_member(&self, id: &MemberId) -> GovernanceResult<bool> {
        Ok(self.read_members().await?.is_member(id))
    }

    pub async fn member_count(&self) -> GovernanceResult<usize> {
        Ok(self.read_members().await?.member_count())
    }

    /// Members in identity order.
    pub async fn members(&self) -> GovernanceResult<Vec<MemberId>> {
        Ok(self.read_members().await?.members().copied().collect())
    }

    // ------------------------------------------------------------------
    // Proposals
    // ------------------------------------------------------------------

    /// Open a proposal to pay `amount` to `recipient`.
    ///
    /// The deadline is `now + voting_window_secs`.
    pub async fn create_proposal(
        &self,
        caller: &MemberId,
        recipient: MemberId,
        amount: u64,
        description: impl Into<String>,
        voting_window_secs: u32,
    ) -> GovernanceResult<ProposalId> {
        let eligible = {
            let members = self.read_members().await?;
            if !members.is_member(caller) {
                return Err(GovernanceError::Unauthorized(*caller));
            }
            match self.config.quorum_policy {
                QuorumPolicy::Live => None,
                QuorumPolicy::Snapshot => Some(members.to_set()),
            }
        };

        let description = description.into();
        validate_terms(&self.config, amount, &description, voting_window_secs)?;

        let terms = ProposalTerms {
            recipient,
            amount,
            description,
            voting_window_secs,
        };
        let proposer = *caller;
        let created_at = self.clock.now();
        let mut deadline = 0;
        let id = self
            .proposals
            .insert_with(|id| {
                let proposal = Proposal::open(id, proposer, terms, created_at, eligible);
                deadline = proposal.voting_deadline;
                proposal
            })
            .await?;

        info!(id, proposer = %proposer.short(), amount, deadline, "proposal created");
        self.events.emit(GovernanceEvent::ProposalCreated {
            id,
            proposer,
            recipient,
            amount,
            voting_deadline: deadline,
            at: created_at,
        });
        Ok(id)
    }

    /// Cast `caller`'s vote on proposal `id`.
    pub async fn cast_vote(
        &self,
        caller: &MemberId,
        id: ProposalId,
        support: bool,
    ) -> GovernanceResult<()> {
        // Existence first, so unknown ids report NotFound regardless of caller.
        self.proposals.get(id).await?;
        self.ensure_member(caller).await?;

        let mut proposal = self.proposals.lock(id).await?;
        let now = self.clock.now();
        proposal.record_vote(*caller, support, now)?;
        let (yes, no) = (proposal.yes_votes, proposal.no_votes);
        drop(proposal);

        info!(id, voter = %caller.short(), support, yes, no, "vote cast");
        self.events.emit(GovernanceEvent::VoteCast {
            id,
            voter: *caller,
            support,
            at: now,
        });
        Ok(())
    }

    /// Decide proposal `id` if its voting window has elapsed.
    ///
    /// Returns the state after the call. Calling it before the deadline, or
    /// on an already decided proposal, changes nothing.
    pub async fn finalize_proposal(&self, id: ProposalId) -> GovernanceResult<ProposalState> {
        let mut proposal = self.proposals.lock(id).await?;
        let now = self.clock.now();
        if proposal.state != ProposalState::Open || now < proposal.voting_deadline {
            return Ok(proposal.state);
        }

        let live_count = match proposal.eligible {
            Some(_) => 0,
            None => self.read_members().await?.member_count(),
        };
        let state = proposal.finalize(now, live_count);
        let (yes_votes, no_votes) = (proposal.yes_votes, proposal.no_votes);
        drop(proposal);

        info!(id, %state, yes_votes, no_votes, "proposal finalized");
        self.events.emit(GovernanceEvent::ProposalFinalized {
            id,
            state,
            yes_votes,
            no_votes,
            at: now,
        });
        Ok(state)
    }

    /// Pay out a passed proposal.
    ///
    /// Holds the proposal lock and then the treasury lock until the transfer
    /// has answered, so at most one transfer is ever issued per proposal.
    /// On failure the proposal stays Passed and may be executed again.
    pub async fn execute_proposal(
        &self,
        caller: &MemberId,
        id: ProposalId,
    ) -> GovernanceResult<()> {
        self.proposals.get(id).await?;
        self.ensure_member(caller).await?;

        let mut proposal = self.proposals.lock(id).await?;
        proposal.ensure_executable()?;

        let mut treasury = self.lock_treasury().await?;
        let now = self.clock.now();
        let (amount, recipient) = (proposal.amount, proposal.recipient);

        if let Err(err) = treasury.withdraw(id, amount, recipient, now).await {
            match &err {
                TreasuryError::Transfer(transfer_err) => {
                    warn!(id, error = %transfer_err, "transfer failed; proposal stays passed");
                    self.events
                        .emit(GovernanceEvent::transfer_failed(id, transfer_err, now));
                }
                other => warn!(id, error = %other, "execution rejected"),
            }
            return Err(err.into());
        }
        let balance = treasury.balance();
        proposal.mark_executed()?;
        drop(treasury);
        drop(proposal);

        info!(id, amount, recipient = %recipient.short(), balance, "proposal executed");
        self.events.emit(GovernanceEvent::ProposalExecuted {
            id,
            recipient,
            amount,
            executed_by: *caller,
            at: now,
        });
        Ok(())
    }

    pub async fn get_proposal(&self, id: ProposalId) -> GovernanceResult<ProposalView> {
        Ok(self.proposals.lock(id).await?.view())
    }

    /// Views of every proposal whose id lies in `range`, in id order.
    ///
    /// Ids at or past the counter are simply absent from the result.
    pub async fn list_proposals<R>(&self, range: R) -> GovernanceResult<Vec<ProposalView>>
    where
        R: RangeBounds<ProposalId>,
    {
        let handles = self.proposals.handles_in(range).await?;
        let mut views = Vec::with_capacity(handles.len());
        for (id, handle) in handles {
            let proposal = self
                .locks
                .acquire(Resource::Proposal(id), || handle.lock())
                .await?;
            views.push(proposal.view());
        }
        Ok(views)
    }

    /// The id the next proposal will receive.
    pub async fn next_proposal_id(&self) -> GovernanceResult<ProposalId> {
        self.proposals.next_id().await
    }

    // ------------------------------------------------------------------
    // Treasury
    // ------------------------------------------------------------------

    pub async fn get_balance(&self) -> GovernanceResult<u64> {
        Ok(self.lock_treasury().await?.balance())
    }

    /// Fund the treasury. Open to any caller. Returns the new balance.
    pub async fn deposit(&self, amount: u64) -> GovernanceResult<u64> {
        let balance = self.lock_treasury().await?.deposit(amount)?;

        info!(amount, balance, "funds deposited");
        self.events.emit(GovernanceEvent::FundsDeposited {
            amount,
            balance,
            at: self.clock.now(),
        });
        Ok(balance)
    }

    // ------------------------------------------------------------------
    // Events & configuration
    // ------------------------------------------------------------------

    pub fn subscribe(&self) -> broadcast::Receiver<GovernanceEvent> {
        self.events.subscribe()
    }

    pub fn event_stream(&self) -> BroadcastStream<GovernanceEvent> {
        self.events.stream()
    }

    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Lock helpers
    // ------------------------------------------------------------------

    async fn read_members(&self) -> GovernanceResult<RwLockReadGuard<'_, MembershipRegistry>> {
        self.locks
            .acquire(Resource::Membership, || self.members.read())
            .await
    }

    async fn lock_treasury(&self) -> GovernanceResult<MutexGuard<'_, Treasury>> {
        self.locks
            .acquire(Resource::Treasury, || self.treasury.lock())
            .await
    }

    async fn ensure_member(&self, caller: &MemberId) -> GovernanceResult<()> {
        if self.read_members().await?.is_member(caller) {
            Ok(())
        } else {
            Err(GovernanceError::Unauthorized(*caller))
        }
    }
}
