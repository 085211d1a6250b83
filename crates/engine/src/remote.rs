//! Remote persistence collaborator.
//!
//! One call per status target plus CRUD and bulk operations. The engine
//! treats this service as the authority: its responses are canonical and
//! overwrite the optimistic guess. Cancellation/timeout of an in-flight call
//! is this collaborator's concern, not the engine's.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;

use stockflow_core::{EngineError, MovementId};
use stockflow_movements::{MovementDraft, MovementStatus, StockMovement};

/// Failure of a remote action call, distinguished from a service-level
/// `success: false` response.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// The service has no action mapped for this target status.
    #[error("no remote action mapped for status {0}")]
    Unsupported(MovementStatus),

    /// The call did not complete (network, timeout, protocol).
    #[error("transport failure: {0}")]
    Transport(String),
}

impl From<ActionError> for EngineError {
    fn from(value: ActionError) -> Self {
        match value {
            ActionError::Unsupported(status) => {
                EngineError::unsupported_transition(format!(
                    "no remote action mapped for status {status}"
                ))
            }
            ActionError::Transport(msg) => EngineError::remote_failure(msg),
        }
    }
}

/// Service-level result of a single-entity action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub success: bool,
    pub data: Option<StockMovement>,
    pub error: Option<String>,
}

impl ActionResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }

    pub fn ok_with(data: StockMovement) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Service-level result of a bulk action, with per-item failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkResponse {
    pub success: bool,
    pub failed: Vec<MovementId>,
    pub error: Option<String>,
}

impl BulkResponse {
    pub fn ok(failed: Vec<MovementId>) -> Self {
        Self {
            success: true,
            failed,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            failed: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// Remote action collaborator: one call per status target plus CRUD.
#[async_trait]
pub trait MovementActions: Send + Sync {
    async fn set_pending(&self, id: MovementId) -> Result<ActionResponse, ActionError>;
    async fn set_approved(&self, id: MovementId) -> Result<ActionResponse, ActionError>;
    async fn set_completed(&self, id: MovementId) -> Result<ActionResponse, ActionError>;
    async fn set_cancelled(
        &self,
        id: MovementId,
        reason: &str,
    ) -> Result<ActionResponse, ActionError>;

    async fn create(&self, draft: MovementDraft) -> Result<ActionResponse, ActionError>;
    async fn update(
        &self,
        id: MovementId,
        draft: MovementDraft,
    ) -> Result<ActionResponse, ActionError>;
    async fn delete(&self, id: MovementId) -> Result<ActionResponse, ActionError>;

    async fn bulk_set_status(
        &self,
        ids: &[MovementId],
        status: MovementStatus,
    ) -> Result<BulkResponse, ActionError>;
    async fn bulk_delete(&self, ids: &[MovementId]) -> Result<BulkResponse, ActionError>;

    /// Authoritative listing, used for full resyncs.
    async fn list(&self) -> Result<Vec<StockMovement>, ActionError>;
}

#[async_trait]
impl<S> MovementActions for Arc<S>
where
    S: MovementActions + ?Sized,
{
    async fn set_pending(&self, id: MovementId) -> Result<ActionResponse, ActionError> {
        (**self).set_pending(id).await
    }

    async fn set_approved(&self, id: MovementId) -> Result<ActionResponse, ActionError> {
        (**self).set_approved(id).await
    }

    async fn set_completed(&self, id: MovementId) -> Result<ActionResponse, ActionError> {
        (**self).set_completed(id).await
    }

    async fn set_cancelled(
        &self,
        id: MovementId,
        reason: &str,
    ) -> Result<ActionResponse, ActionError> {
        (**self).set_cancelled(id, reason).await
    }

    async fn create(&self, draft: MovementDraft) -> Result<ActionResponse, ActionError> {
        (**self).create(draft).await
    }

    async fn update(
        &self,
        id: MovementId,
        draft: MovementDraft,
    ) -> Result<ActionResponse, ActionError> {
        (**self).update(id, draft).await
    }

    async fn delete(&self, id: MovementId) -> Result<ActionResponse, ActionError> {
        (**self).delete(id).await
    }

    async fn bulk_set_status(
        &self,
        ids: &[MovementId],
        status: MovementStatus,
    ) -> Result<BulkResponse, ActionError> {
        (**self).bulk_set_status(ids, status).await
    }

    async fn bulk_delete(&self, ids: &[MovementId]) -> Result<BulkResponse, ActionError> {
        (**self).bulk_delete(ids).await
    }

    async fn list(&self) -> Result<Vec<StockMovement>, ActionError> {
        (**self).list().await
    }
}

/// In-memory movement service.
///
/// Intended for tests/dev. Holds the authoritative record set, re-checks
/// edge legality server-side, and supports failure / unsupported-status
/// injection. Every call is recorded by name so tests can assert how many
/// remote round trips an operation issued.
#[derive(Debug, Default)]
pub struct InMemoryMovementService {
    records: RwLock<HashMap<MovementId, StockMovement>>,
    calls: Mutex<Vec<&'static str>>,
    fail_next: Mutex<Option<String>>,
    unsupported: RwLock<HashSet<MovementStatus>>,
}

impl InMemoryMovementService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record server-side without going through `create`.
    pub fn seed(&self, movement: StockMovement) {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(movement.id(), movement);
    }

    /// Report the next call as a service-level failure.
    pub fn fail_next_call(&self, error: impl Into<String>) {
        *self
            .fail_next
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(error.into());
    }

    /// Pretend the service has no action mapped for `status`.
    pub fn mark_unsupported(&self, status: MovementStatus) {
        self.unsupported
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(status);
    }

    /// Server-side truth for one record.
    pub fn record(&self, id: MovementId) -> Option<StockMovement> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// Names of the calls issued so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record_call(&self, name: &'static str) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(name);
    }

    fn take_failure(&self) -> Option<String> {
        self.fail_next
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn is_unsupported(&self, status: MovementStatus) -> bool {
        self.unsupported
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&status)
    }

    fn apply_status(
        &self,
        name: &'static str,
        id: MovementId,
        status: MovementStatus,
        reason: Option<&str>,
    ) -> Result<ActionResponse, ActionError> {
        self.record_call(name);
        if self.is_unsupported(status) {
            return Err(ActionError::Unsupported(status));
        }
        if let Some(error) = self.take_failure() {
            return Ok(ActionResponse::failed(error));
        }

        let mut records = self
            .records
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(movement) = records.get_mut(&id) else {
            return Ok(ActionResponse::failed(format!("movement {id} not found")));
        };

        // The service is the authority: it re-checks edge legality itself.
        if let Err(err) = movement.status().ensure_can_transition_to(status) {
            return Ok(ActionResponse::failed(err.to_string()));
        }

        movement.set_status(status);
        if let Some(reason) = reason {
            movement.set_rejection_reason(Some(reason.to_string()));
        }
        movement.set_updated_at(Utc::now());
        Ok(ActionResponse::ok_with(movement.clone()))
    }
}

#[async_trait]
impl MovementActions for InMemoryMovementService {
    async fn set_pending(&self, id: MovementId) -> Result<ActionResponse, ActionError> {
        self.apply_status("set_pending", id, MovementStatus::Pending, None)
    }

    async fn set_approved(&self, id: MovementId) -> Result<ActionResponse, ActionError> {
        self.apply_status("set_approved", id, MovementStatus::Approved, None)
    }

    async fn set_completed(&self, id: MovementId) -> Result<ActionResponse, ActionError> {
        self.apply_status("set_completed", id, MovementStatus::Completed, None)
    }

    async fn set_cancelled(
        &self,
        id: MovementId,
        reason: &str,
    ) -> Result<ActionResponse, ActionError> {
        self.apply_status("set_cancelled", id, MovementStatus::Cancelled, Some(reason))
    }

    async fn create(&self, draft: MovementDraft) -> Result<ActionResponse, ActionError> {
        self.record_call("create");
        if let Some(error) = self.take_failure() {
            return Ok(ActionResponse::failed(error));
        }

        let movement = match StockMovement::create(MovementId::new(), draft, Utc::now()) {
            Ok(movement) => movement,
            Err(err) => return Ok(ActionResponse::failed(err.to_string())),
        };
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(movement.id(), movement.clone());
        Ok(ActionResponse::ok_with(movement))
    }

    async fn update(
        &self,
        id: MovementId,
        draft: MovementDraft,
    ) -> Result<ActionResponse, ActionError> {
        self.record_call("update");
        if let Some(error) = self.take_failure() {
            return Ok(ActionResponse::failed(error));
        }

        let mut records = self
            .records
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(movement) = records.get_mut(&id) else {
            return Ok(ActionResponse::failed(format!("movement {id} not found")));
        };
        if movement.status() != MovementStatus::Pending {
            return Ok(ActionResponse::failed(format!(
                "cannot edit movement in status {}",
                movement.status()
            )));
        }
        if let Err(err) = movement.apply_edit(draft, Utc::now()) {
            return Ok(ActionResponse::failed(err.to_string()));
        }
        Ok(ActionResponse::ok_with(movement.clone()))
    }

    async fn delete(&self, id: MovementId) -> Result<ActionResponse, ActionError> {
        self.record_call("delete");
        if let Some(error) = self.take_failure() {
            return Ok(ActionResponse::failed(error));
        }

        let mut records = self
            .records
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(movement) = records.get(&id) else {
            return Ok(ActionResponse::failed(format!("movement {id} not found")));
        };
        if !movement.status().is_deletable() {
            return Ok(ActionResponse::failed(format!(
                "cannot delete movement in status {}",
                movement.status()
            )));
        }
        records.remove(&id);
        Ok(ActionResponse::ok())
    }

    async fn bulk_set_status(
        &self,
        ids: &[MovementId],
        status: MovementStatus,
    ) -> Result<BulkResponse, ActionError> {
        self.record_call("bulk_set_status");
        if self.is_unsupported(status) {
            return Err(ActionError::Unsupported(status));
        }
        if let Some(error) = self.take_failure() {
            return Ok(BulkResponse::failed(error));
        }

        let mut records = self
            .records
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut failed = Vec::new();
        for id in ids {
            match records.get_mut(id) {
                Some(movement) if movement.status().can_transition_to(status) => {
                    movement.set_status(status);
                    movement.set_updated_at(Utc::now());
                }
                _ => failed.push(*id),
            }
        }
        Ok(BulkResponse::ok(failed))
    }

    async fn bulk_delete(&self, ids: &[MovementId]) -> Result<BulkResponse, ActionError> {
        self.record_call("bulk_delete");
        if let Some(error) = self.take_failure() {
            return Ok(BulkResponse::failed(error));
        }

        let mut records = self
            .records
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut failed = Vec::new();
        for id in ids {
            match records.get(id) {
                Some(movement) if movement.status().is_deletable() => {
                    records.remove(id);
                }
                _ => failed.push(*id),
            }
        }
        Ok(BulkResponse::ok(failed))
    }

    async fn list(&self) -> Result<Vec<StockMovement>, ActionError> {
        self.record_call("list");
        if let Some(error) = self.take_failure() {
            return Err(ActionError::Transport(error));
        }

        let records = self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut listing: Vec<StockMovement> = records.values().cloned().collect();
        listing.sort_by_key(|m| (m.created_at(), *m.id().as_uuid().as_bytes()));
        Ok(listing)
    }
}
