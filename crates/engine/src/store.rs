//! Keyed movement cache with per-entity request sequencing.
//!
//! The cache is the shared resource of the whole engine: the optimistic
//! window lives here, and every write goes through one reducer
//! ([`MovementStore::apply`]) so the optimistic apply, the canonical merge
//! and the rollback share a single code path. Locks are never held across an
//! await.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use stockflow_core::{EngineError, MovementId};
use stockflow_movements::{MovementStatus, StockMovement};

/// Pre-mutation snapshot captured for rollback: exactly the fields the
/// optimistic apply may touch.
#[derive(Debug, Clone, PartialEq, Eq)]
struct StatusSnapshot {
    status: MovementStatus,
    rejection_reason: Option<String>,
}

/// Claim on an in-flight transition: the rollback snapshot plus the request
/// ticket that decides whether the continuation is still authoritative when
/// it settles.
#[derive(Debug, Clone)]
pub struct TransitionTicket {
    id: MovementId,
    seq: u64,
    snapshot: StatusSnapshot,
}

impl TransitionTicket {
    pub fn movement_id(&self) -> MovementId {
        self.id
    }
}

/// What happened to a settling continuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleOutcome {
    /// The continuation was the latest issued request for its entity and
    /// took effect.
    Applied,
    /// A newer request was issued meanwhile; the continuation no-oped
    /// instead of clobbering the newer optimistic or confirmed state.
    Stale,
}

/// Single mutation funnel for the cache.
#[derive(Debug)]
enum Mutation {
    /// Speculative status change, visible before the remote action settles.
    Optimistic {
        id: MovementId,
        status: MovementStatus,
        rejection_reason: Option<String>,
    },
    /// Canonical server entity replacing the optimistic guess.
    Merge {
        id: MovementId,
        canonical: StockMovement,
    },
    /// Exact restore of the pre-mutation snapshot.
    Revert {
        id: MovementId,
        snapshot: StatusSnapshot,
    },
    Upsert(StockMovement),
    Remove(MovementId),
    ReplaceAll(Vec<StockMovement>),
}

#[derive(Debug, Default)]
struct StoreInner {
    movements: HashMap<MovementId, StockMovement>,
    /// Latest issued request ticket per movement. Kept outside `movements`
    /// so it survives resync swaps.
    tickets: HashMap<MovementId, u64>,
}

/// In-memory movement cache keyed by id.
#[derive(Debug, Default)]
pub struct MovementStore {
    inner: RwLock<StoreInner>,
}

impl MovementStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: MovementId) -> Option<StockMovement> {
        self.read().movements.get(&id).cloned()
    }

    /// All cached movements, oldest first.
    pub fn list(&self) -> Vec<StockMovement> {
        let inner = self.read();
        let mut listing: Vec<StockMovement> = inner.movements.values().cloned().collect();
        listing.sort_by_key(|m| (m.created_at(), *m.id().as_uuid().as_bytes()));
        listing
    }

    pub fn len(&self) -> usize {
        self.read().movements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().movements.is_empty()
    }

    pub fn upsert(&self, movement: StockMovement) {
        self.apply(Mutation::Upsert(movement));
    }

    pub fn remove(&self, id: MovementId) {
        self.apply(Mutation::Remove(id));
    }

    /// Replace the whole cache with the authoritative listing.
    ///
    /// Request tickets survive the swap so stale continuations remain
    /// detectable across resyncs.
    pub fn replace_all(&self, movements: Vec<StockMovement>) {
        self.apply(Mutation::ReplaceAll(movements));
    }

    /// Steps one to three of a transition, atomically under one lock:
    /// legality check against the current cached status, rollback snapshot,
    /// optimistic apply, and a fresh request ticket.
    ///
    /// Local validation failures (`NotFound`, `IllegalTransition`) leave the
    /// cache untouched.
    pub fn begin_transition(
        &self,
        id: MovementId,
        target: MovementStatus,
        rejection_reason: Option<String>,
    ) -> Result<TransitionTicket, EngineError> {
        let mut inner = self.write();

        let movement = inner.movements.get(&id).ok_or_else(EngineError::not_found)?;
        movement.status().ensure_can_transition_to(target)?;
        let snapshot = StatusSnapshot {
            status: movement.status(),
            rejection_reason: movement.rejection_reason().map(str::to_string),
        };

        let ticket = inner.tickets.entry(id).or_insert(0);
        *ticket += 1;
        let seq = *ticket;

        Self::reduce(
            &mut inner,
            Mutation::Optimistic {
                id,
                status: target,
                rejection_reason,
            },
        );

        Ok(TransitionTicket { id, seq, snapshot })
    }

    /// Settle a successful remote response: the canonical entity replaces
    /// the optimistic guess, unless a newer request was issued meanwhile.
    pub fn settle_success(
        &self,
        ticket: &TransitionTicket,
        canonical: Option<StockMovement>,
    ) -> SettleOutcome {
        let mut inner = self.write();
        if Self::is_stale(&inner, ticket) {
            return SettleOutcome::Stale;
        }
        if let Some(canonical) = canonical {
            Self::reduce(
                &mut inner,
                Mutation::Merge {
                    id: ticket.id,
                    canonical,
                },
            );
        }
        SettleOutcome::Applied
    }

    /// Settle a failed remote response: restore the snapshot exactly (no
    /// torn state), unless a newer request was issued meanwhile.
    pub fn settle_failure(&self, ticket: &TransitionTicket) -> SettleOutcome {
        let mut inner = self.write();
        if Self::is_stale(&inner, ticket) {
            return SettleOutcome::Stale;
        }
        Self::reduce(
            &mut inner,
            Mutation::Revert {
                id: ticket.id,
                snapshot: ticket.snapshot.clone(),
            },
        );
        SettleOutcome::Applied
    }

    fn is_stale(inner: &StoreInner, ticket: &TransitionTicket) -> bool {
        inner.tickets.get(&ticket.id).copied() != Some(ticket.seq)
    }

    fn apply(&self, mutation: Mutation) {
        let mut inner = self.write();
        Self::reduce(&mut inner, mutation);
    }

    /// The single reducer: every cache write lands here.
    fn reduce(inner: &mut StoreInner, mutation: Mutation) {
        match mutation {
            Mutation::Optimistic {
                id,
                status,
                rejection_reason,
            } => {
                if let Some(movement) = inner.movements.get_mut(&id) {
                    movement.set_status(status);
                    if rejection_reason.is_some() {
                        movement.set_rejection_reason(rejection_reason);
                    }
                }
            }
            Mutation::Merge { id, canonical } => {
                inner.movements.insert(id, canonical);
            }
            Mutation::Revert { id, snapshot } => {
                if let Some(movement) = inner.movements.get_mut(&id) {
                    movement.set_status(snapshot.status);
                    movement.set_rejection_reason(snapshot.rejection_reason);
                }
            }
            Mutation::Upsert(movement) => {
                inner.movements.insert(movement.id(), movement);
            }
            Mutation::Remove(id) => {
                inner.movements.remove(&id);
            }
            Mutation::ReplaceAll(movements) => {
                inner.movements = movements.into_iter().map(|m| (m.id(), m)).collect();
            }
        }
    }

    // The reducer never panics mid-mutation, so a poisoned lock still holds
    // consistent state.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, StoreInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, StoreInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
