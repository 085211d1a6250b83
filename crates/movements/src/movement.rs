use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockflow_core::{EngineError, MovementId, ProductId, StoreId};

use crate::status::MovementStatus;

/// Movement classification derived from the sign of the quantity difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MovementKind {
    Increase,
    Decrease,
    NoChange,
}

impl MovementKind {
    pub fn from_difference(difference: i64) -> Self {
        match difference {
            d if d > 0 => MovementKind::Increase,
            d if d < 0 => MovementKind::Decrease,
            _ => MovementKind::NoChange,
        }
    }
}

/// Delta between the resolved previous quantity and the submitted value.
///
/// Always derived from its inputs, never persisted independently of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantityDelta {
    pub difference: i64,
    pub kind: MovementKind,
}

/// Compute the difference and movement classification for an adjustment line.
///
/// Pure; the reason-required side-constraint is enforced by
/// [`MovementDraft::validate`], not here.
pub fn quantity_delta(previous_quantity: i64, actual_quantity: i64) -> QuantityDelta {
    let difference = actual_quantity - previous_quantity;
    QuantityDelta {
        difference,
        kind: MovementKind::from_difference(difference),
    }
}

/// Store-level shape of a movement: a single-store correction or an
/// inter-store move. Adjustments and transfers share the same workflow
/// engine; this is the only place they differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementDetail {
    Adjustment {
        store_id: StoreId,
        actual_quantity: i64,
    },
    Transfer {
        from_store: StoreId,
        to_store: StoreId,
        quantity: i64,
    },
}

/// Submission payload for creating or editing a movement.
///
/// `previous_quantity` is resolved by the caller at submission/edit time from
/// the most specific available catalog source. It is a point-in-time fact and
/// is never silently recomputed from a different source afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementDraft {
    pub product_id: ProductId,
    pub sku: Option<String>,
    pub previous_quantity: i64,
    pub detail: MovementDetail,
    pub reason: Option<String>,
}

impl MovementDraft {
    /// Validate the draft before any remote call is issued.
    ///
    /// - Adjustments with a nonzero difference require a non-empty reason.
    /// - Transfers must name two distinct stores and a positive quantity.
    pub fn validate(&self) -> Result<(), EngineError> {
        match &self.detail {
            MovementDetail::Adjustment {
                actual_quantity, ..
            } => {
                let delta = quantity_delta(self.previous_quantity, *actual_quantity);
                if delta.difference != 0 && !has_text(self.reason.as_deref()) {
                    return Err(EngineError::reason_required(format!(
                        "difference of {} requires a reason",
                        delta.difference
                    )));
                }
            }
            MovementDetail::Transfer {
                from_store,
                to_store,
                quantity,
            } => {
                if from_store == to_store {
                    return Err(EngineError::validation(
                        "transfer source and destination stores must differ",
                    ));
                }
                if *quantity <= 0 {
                    return Err(EngineError::validation(
                        "transfer quantity must be positive",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Difference and classification for adjustment drafts; transfers carry
    /// no difference.
    pub fn delta(&self) -> Option<QuantityDelta> {
        match &self.detail {
            MovementDetail::Adjustment {
                actual_quantity, ..
            } => Some(quantity_delta(self.previous_quantity, *actual_quantity)),
            MovementDetail::Transfer { .. } => None,
        }
    }
}

fn has_text(value: Option<&str>) -> bool {
    value.is_some_and(|s| !s.trim().is_empty())
}

/// A stock movement as confirmed by the remote service.
///
/// The id is assigned remotely on creation; the status is mutable only
/// through transitions approved by [`MovementStatus::next_states`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    id: MovementId,
    status: MovementStatus,
    product_id: ProductId,
    sku: Option<String>,
    previous_quantity: i64,
    detail: MovementDetail,
    reason: Option<String>,
    rejection_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StockMovement {
    /// Materialize a newly created movement from a validated draft.
    ///
    /// New movements always start in `pending`.
    pub fn create(
        id: MovementId,
        draft: MovementDraft,
        created_at: DateTime<Utc>,
    ) -> Result<Self, EngineError> {
        draft.validate()?;
        Ok(Self {
            id,
            status: MovementStatus::Pending,
            product_id: draft.product_id,
            sku: draft.sku,
            previous_quantity: draft.previous_quantity,
            detail: draft.detail,
            reason: draft.reason,
            rejection_reason: None,
            created_at,
            updated_at: created_at,
        })
    }

    pub fn id(&self) -> MovementId {
        self.id
    }

    pub fn status(&self) -> MovementStatus {
        self.status
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn sku(&self) -> Option<&str> {
        self.sku.as_deref()
    }

    pub fn previous_quantity(&self) -> i64 {
        self.previous_quantity
    }

    pub fn detail(&self) -> &MovementDetail {
        &self.detail
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Cancellation note; captured only on transition to `cancelled`.
    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Difference and classification for adjustments; transfers carry none.
    ///
    /// Recomputed from its inputs on every call.
    pub fn delta(&self) -> Option<QuantityDelta> {
        match &self.detail {
            MovementDetail::Adjustment {
                actual_quantity, ..
            } => Some(quantity_delta(self.previous_quantity, *actual_quantity)),
            MovementDetail::Transfer { .. } => None,
        }
    }

    /// Apply an edit to a pending movement, revalidating the draft.
    ///
    /// Edge legality for the *status* is not this method's concern; callers
    /// gate edits to `pending` movements before invoking it.
    pub fn apply_edit(
        &mut self,
        draft: MovementDraft,
        updated_at: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        draft.validate()?;
        self.product_id = draft.product_id;
        self.sku = draft.sku;
        self.previous_quantity = draft.previous_quantity;
        self.detail = draft.detail;
        self.reason = draft.reason;
        self.updated_at = updated_at;
        Ok(())
    }

    /// Raw status overwrite, used by the engine's mutation reducer for both
    /// the optimistic apply and the rollback. Edge legality is checked by the
    /// caller via [`MovementStatus::ensure_can_transition_to`].
    pub fn set_status(&mut self, status: MovementStatus) {
        self.status = status;
    }

    /// Raw cancellation-note overwrite, used by the engine's mutation
    /// reducer alongside [`StockMovement::set_status`].
    pub fn set_rejection_reason(&mut self, rejection_reason: Option<String>) {
        self.rejection_reason = rejection_reason;
    }

    pub fn set_updated_at(&mut self, updated_at: DateTime<Utc>) {
        self.updated_at = updated_at;
    }
}
