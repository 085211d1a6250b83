//! Bulk operations over a selection.

use std::collections::HashSet;
use std::sync::Arc;

use stockflow_core::{EngineError, MovementId};
use stockflow_movements::MovementStatus;

use crate::config::{EngineConfig, PartialFailurePolicy};
use crate::notify::Notifier;
use crate::remote::MovementActions;
use crate::store::MovementStore;

/// Current multi-select over the movement list.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Selection {
    ids: HashSet<MovementId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: MovementId) {
        self.ids.insert(id);
    }

    pub fn remove(&mut self, id: MovementId) {
        self.ids.remove(&id);
    }

    pub fn toggle(&mut self, id: MovementId) {
        if !self.ids.insert(id) {
            self.ids.remove(&id);
        }
    }

    pub fn contains(&self, id: MovementId) -> bool {
        self.ids.contains(&id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Selected ids in a deterministic order.
    pub fn ids(&self) -> Vec<MovementId> {
        let mut ids: Vec<MovementId> = self.ids.iter().copied().collect();
        ids.sort_by_key(|id| *id.as_uuid().as_bytes());
        ids
    }
}

impl FromIterator<MovementId> for Selection {
    fn from_iter<T: IntoIterator<Item = MovementId>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

/// Action applied across the whole selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    SetStatus(MovementStatus),
    Delete,
}

/// What a bulk operation reported back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkOutcome {
    pub attempted: usize,
    /// Ids the service could not apply the action to. Empty under
    /// [`PartialFailurePolicy::AllOrNothing`] (failures become an error).
    pub failed: Vec<MovementId>,
}

/// Applies one action to the full selection via a single bulk remote call,
/// then unconditionally clears the selection and forces a full resync.
///
/// Correctness after a bulk action is obtained purely by refetching; partial
/// bulk results are never merged into the cache.
#[derive(Debug)]
pub struct BulkOperationCoordinator<A, N> {
    actions: A,
    notifier: N,
    store: Arc<MovementStore>,
    config: EngineConfig,
}

impl<A, N> BulkOperationCoordinator<A, N>
where
    A: MovementActions,
    N: Notifier,
{
    pub fn new(actions: A, notifier: N, store: Arc<MovementStore>, config: EngineConfig) -> Self {
        Self {
            actions,
            notifier,
            store,
            config,
        }
    }

    pub async fn apply_bulk(
        &self,
        selection: &mut Selection,
        action: BulkAction,
    ) -> Result<BulkOutcome, EngineError> {
        if selection.is_empty() {
            return Ok(BulkOutcome {
                attempted: 0,
                failed: Vec::new(),
            });
        }

        let ids = selection.ids();
        let attempted = ids.len();

        // One bulk call for the whole selection, never N individual calls.
        let dispatched = match action {
            BulkAction::SetStatus(status) => self.actions.bulk_set_status(&ids, status).await,
            BulkAction::Delete => self.actions.bulk_delete(&ids).await,
        };

        // Clear + resync happen unconditionally, before any error is
        // reported.
        selection.clear();
        let resync = self.resync().await;

        let response = match dispatched {
            Ok(response) => response,
            Err(err) => {
                let engine_err = EngineError::from(err);
                self.notifier
                    .error(&format!("bulk action failed: {engine_err}"));
                return Err(engine_err);
            }
        };
        resync?;

        if !response.success {
            let error = response
                .error
                .unwrap_or_else(|| "bulk action failed".to_string());
            self.notifier.error(&format!("bulk action failed: {error}"));
            return Err(EngineError::remote_failure(error));
        }

        if !response.failed.is_empty() {
            let summary = format!(
                "bulk action failed for {} of {} movements",
                response.failed.len(),
                attempted
            );
            match self.config.partial_failure {
                PartialFailurePolicy::AllOrNothing => {
                    self.notifier.error(&summary);
                    return Err(EngineError::remote_failure(summary));
                }
                PartialFailurePolicy::PerItem => {
                    self.notifier.error(&summary);
                    return Ok(BulkOutcome {
                        attempted,
                        failed: response.failed,
                    });
                }
            }
        }

        self.notifier
            .success(&format!("bulk action applied to {attempted} movements"));
        Ok(BulkOutcome {
            attempted,
            failed: Vec::new(),
        })
    }

    async fn resync(&self) -> Result<(), EngineError> {
        let listing = self.actions.list().await?;
        self.store.replace_all(listing);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_membership() {
        let id = MovementId::new();
        let mut selection = Selection::new();
        selection.toggle(id);
        assert!(selection.contains(id));
        selection.toggle(id);
        assert!(!selection.contains(id));
    }

    #[test]
    fn ids_are_deterministically_ordered() {
        let mut selection = Selection::new();
        let mut expected: Vec<MovementId> = (0..8).map(|_| MovementId::new()).collect();
        for id in &expected {
            selection.insert(*id);
        }
        expected.sort_by_key(|id| *id.as_uuid().as_bytes());
        assert_eq!(selection.ids(), expected);
    }
}
