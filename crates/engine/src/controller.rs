//! Optimistic transition controller.
//!
//! The only component that touches both the shared cache and the remote
//! action collaborator. The execution pipeline for a transition is:
//!
//! ```text
//! intent (id, target, reason)
//!   |
//! 1. legality check against the transition table   (pure, synchronous)
//! 2. rollback snapshot                             (one store lock,
//! 3. optimistic apply + request ticket              all three atomic)
//!   |
//! 4. dispatch the remote action mapped to the target
//!   |
//! 5a. success: canonical merge -> full resync -> success notification
//! 5b. failure: exact snapshot rollback -> error notification
//! ```
//!
//! A continuation that settles after a newer request was issued for the same
//! entity detects it via its ticket and no-ops.

use std::sync::Arc;

use tracing::{info, warn};

use stockflow_core::{EngineError, MovementId};
use stockflow_movements::{MovementDraft, MovementStatus, StockMovement};

use crate::notify::Notifier;
use crate::remote::{ActionError, ActionResponse, MovementActions};
use crate::store::{MovementStore, SettleOutcome, TransitionTicket};

/// Result of a settled transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The transition settled and its effect is visible in the cache.
    Applied(StockMovement),
    /// A newer request for the same entity settled first; this continuation
    /// no-oped.
    Superseded,
}

/// Workflow controller for stock movements.
///
/// Generic over the remote collaborator and the notification surface so
/// tests can inject in-memory implementations.
#[derive(Debug)]
pub struct TransitionEngine<A, N> {
    actions: A,
    notifier: N,
    store: Arc<MovementStore>,
}

impl<A, N> TransitionEngine<A, N> {
    pub fn new(actions: A, notifier: N, store: Arc<MovementStore>) -> Self {
        Self {
            actions,
            notifier,
            store,
        }
    }

    pub fn store(&self) -> &MovementStore {
        &self.store
    }
}

impl<A, N> TransitionEngine<A, N>
where
    A: MovementActions,
    N: Notifier,
{
    /// Apply a status transition optimistically.
    ///
    /// Local validation failures (`NotFound`, `IllegalTransition`) are
    /// returned before any cache mutation or remote call. Remote failures
    /// roll the cache back to the exact pre-mutation snapshot.
    pub async fn apply_transition(
        &self,
        id: MovementId,
        target: MovementStatus,
        reason: Option<String>,
    ) -> Result<TransitionOutcome, EngineError> {
        let ticket = self.store.begin_transition(id, target, reason.clone())?;

        match self.dispatch_status_action(id, target, reason.as_deref()).await {
            Ok(response) if response.success => {
                let canonical = response.data.clone();
                match self.store.settle_success(&ticket, response.data) {
                    SettleOutcome::Stale => {
                        info!(%id, %target, "transition superseded by a newer request");
                        Ok(TransitionOutcome::Superseded)
                    }
                    SettleOutcome::Applied => {
                        if let Err(err) = self.refresh().await {
                            warn!(%id, error = %err, "post-transition resync failed");
                        }
                        self.notifier
                            .success(&format!("movement {id} is now {target}"));
                        let movement = self
                            .store
                            .get(id)
                            .or(canonical)
                            .ok_or_else(EngineError::not_found)?;
                        Ok(TransitionOutcome::Applied(movement))
                    }
                }
            }
            Ok(response) => {
                let error = response
                    .error
                    .unwrap_or_else(|| "remote action failed".to_string());
                self.rollback(&ticket, target, &error);
                Err(EngineError::remote_failure(error))
            }
            Err(err) => {
                let engine_err = EngineError::from(err);
                self.rollback(&ticket, target, &engine_err.to_string());
                Err(engine_err)
            }
        }
    }

    /// Submit a new movement.
    ///
    /// There is no optimistic window for creation: the id is assigned by the
    /// service, so the cache only learns about the movement from the
    /// canonical response.
    pub async fn submit(&self, draft: MovementDraft) -> Result<StockMovement, EngineError> {
        draft.validate()?;

        match self.actions.create(draft).await {
            Ok(response) if response.success => {
                let Some(movement) = response.data else {
                    return Err(EngineError::remote_failure(
                        "create returned no entity",
                    ));
                };
                self.store.upsert(movement.clone());
                if let Err(err) = self.refresh().await {
                    warn!(id = %movement.id(), error = %err, "post-create resync failed");
                }
                self.notifier
                    .success(&format!("movement {} submitted", movement.id()));
                Ok(movement)
            }
            other => Err(self.report_failure("submit", other)),
        }
    }

    /// Edit a pending movement.
    pub async fn update(
        &self,
        id: MovementId,
        draft: MovementDraft,
    ) -> Result<StockMovement, EngineError> {
        let current = self.store.get(id).ok_or_else(EngineError::not_found)?;
        if current.status() != MovementStatus::Pending {
            return Err(EngineError::illegal_transition(format!(
                "cannot edit movement in status {}",
                current.status()
            )));
        }
        draft.validate()?;

        match self.actions.update(id, draft).await {
            Ok(response) if response.success => {
                let Some(movement) = response.data else {
                    return Err(EngineError::remote_failure(
                        "update returned no entity",
                    ));
                };
                self.store.upsert(movement.clone());
                if let Err(err) = self.refresh().await {
                    warn!(%id, error = %err, "post-update resync failed");
                }
                self.notifier.success(&format!("movement {id} updated"));
                Ok(movement)
            }
            other => Err(self.report_failure("update", other)),
        }
    }

    /// Delete a movement; allowed only while pending or cancelled.
    pub async fn delete(&self, id: MovementId) -> Result<(), EngineError> {
        let current = self.store.get(id).ok_or_else(EngineError::not_found)?;
        if !current.status().is_deletable() {
            return Err(EngineError::illegal_transition(format!(
                "cannot delete movement in status {}",
                current.status()
            )));
        }

        match self.actions.delete(id).await {
            Ok(response) if response.success => {
                self.store.remove(id);
                if let Err(err) = self.refresh().await {
                    warn!(%id, error = %err, "post-delete resync failed");
                }
                self.notifier.success(&format!("movement {id} deleted"));
                Ok(())
            }
            other => Err(self.report_failure("delete", other)),
        }
    }

    /// Full resync: the authoritative listing replaces the cache.
    pub async fn refresh(&self) -> Result<(), EngineError> {
        let listing = self.actions.list().await?;
        self.store.replace_all(listing);
        Ok(())
    }

    /// One remote action per target status.
    async fn dispatch_status_action(
        &self,
        id: MovementId,
        target: MovementStatus,
        reason: Option<&str>,
    ) -> Result<ActionResponse, ActionError> {
        match target {
            MovementStatus::Pending => self.actions.set_pending(id).await,
            MovementStatus::Approved => self.actions.set_approved(id).await,
            MovementStatus::Completed => self.actions.set_completed(id).await,
            MovementStatus::Cancelled => {
                self.actions
                    .set_cancelled(id, reason.unwrap_or_default())
                    .await
            }
        }
    }

    fn rollback(&self, ticket: &TransitionTicket, target: MovementStatus, error: &str) {
        match self.store.settle_failure(ticket) {
            SettleOutcome::Applied => {
                self.notifier.error(&format!(
                    "movement {} could not move to {target}, reverted: {error}",
                    ticket.movement_id()
                ));
            }
            SettleOutcome::Stale => {
                // A newer request owns the entity; there is nothing to revert.
                warn!(
                    id = %ticket.movement_id(),
                    %target,
                    %error,
                    "stale transition failure discarded"
                );
            }
        }
    }

    fn report_failure(
        &self,
        operation: &str,
        outcome: Result<ActionResponse, ActionError>,
    ) -> EngineError {
        let err = match outcome {
            Ok(response) => EngineError::remote_failure(
                response
                    .error
                    .unwrap_or_else(|| format!("{operation} failed")),
            ),
            Err(action_err) => EngineError::from(action_err),
        };
        self.notifier.error(&format!("{operation} failed: {err}"));
        err
    }
}
