//! Workflow orchestration: the optimistic transition controller and its
//! collaborators.
//!
//! This crate composes the pure domain (movements, catalog) with the remote
//! action collaborator. It owns the in-memory movement cache; every cache
//! mutation funnels through the store's single reducer so the optimistic
//! apply, the canonical merge and the rollback share one code path.

pub mod bulk;
pub mod cancellation;
pub mod config;
pub mod controller;
pub mod notify;
pub mod permissions;
pub mod remote;
pub mod store;
pub mod submission;


pub use bulk::{BulkAction, BulkOperationCoordinator, BulkOutcome, Selection};
pub use cancellation::{CancellationFlow, CancellationOutcome, MAX_REASON_LEN, ReasonPrompt};
pub use config::{EngineConfig, PartialFailurePolicy};
pub use controller::{TransitionEngine, TransitionOutcome};
pub use notify::{Notifier, TracingNotifier};
pub use permissions::{AllowAll, ModuleKey, PermissionAction, PermissionGate, allowed_actions};
pub use remote::{
    ActionError, ActionResponse, BulkResponse, InMemoryMovementService, MovementActions,
};
pub use store::{MovementStore, SettleOutcome, TransitionTicket};
pub use submission::{build_adjustment, build_transfer};
