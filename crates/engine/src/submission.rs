//! Submission builders.
//!
//! A submission resolves the previous-quantity snapshot from the catalog
//! record, assembles the draft, and validates it — all before any remote
//! call. The snapshot taken here is the one the movement keeps for its whole
//! life.

use stockflow_catalog::{ProductRecord, resolve_previous_quantity};
use stockflow_core::{EngineError, StoreId};
use stockflow_movements::{MovementDetail, MovementDraft};

/// Build a stock-adjustment draft for one product/variant/store line.
///
/// `caller_supplied` is the optional quantity override forwarded to the
/// resolver (it participates in the resolution precedence, it does not
/// bypass it).
pub fn build_adjustment(
    product: &ProductRecord,
    variant_selector: Option<&str>,
    store_id: StoreId,
    actual_quantity: i64,
    reason: Option<String>,
    caller_supplied: Option<i64>,
) -> Result<MovementDraft, EngineError> {
    let line = resolve_previous_quantity(product, variant_selector, store_id, caller_supplied);

    let draft = MovementDraft {
        product_id: product.id,
        sku: line.sku,
        previous_quantity: line.quantity,
        detail: MovementDetail::Adjustment {
            store_id,
            actual_quantity,
        },
        reason,
    };
    draft.validate()?;
    Ok(draft)
}

/// Build a stock-transfer draft. The previous-quantity snapshot is taken
/// against the source store.
pub fn build_transfer(
    product: &ProductRecord,
    variant_selector: Option<&str>,
    from_store: StoreId,
    to_store: StoreId,
    quantity: i64,
    reason: Option<String>,
    caller_supplied: Option<i64>,
) -> Result<MovementDraft, EngineError> {
    let line = resolve_previous_quantity(product, variant_selector, from_store, caller_supplied);

    let draft = MovementDraft {
        product_id: product.id,
        sku: line.sku,
        previous_quantity: line.quantity,
        detail: MovementDetail::Transfer {
            from_store,
            to_store,
            quantity,
        },
        reason,
    };
    draft.validate()?;
    Ok(draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockflow_catalog::{
        StoreRecord, StoreRef, StoreStockEntry, StoreStocks, VariantRecord,
    };
    use stockflow_core::ProductId;
    use stockflow_movements::quantity_delta;

    fn product(store_id: StoreId) -> ProductRecord {
        ProductRecord {
            id: ProductId::new(),
            name: "Shirt".to_string(),
            sku: Some("SHIRT".to_string()),
            quantity: Some(200),
            stocks: StoreStocks::List(vec![StoreStockEntry {
                store: StoreRef::Id(store_id),
                quantity: 50,
            }]),
            variants: vec![VariantRecord {
                id: None,
                title: Some("Red/L".to_string()),
                value: None,
                sku: Some("SHIRT-RED-L".to_string()),
                stocks: StoreStocks::List(vec![StoreStockEntry {
                    store: StoreRef::Record(StoreRecord {
                        id: store_id,
                        name: Some("S1".to_string()),
                    }),
                    quantity: 12,
                }]),
            }],
        }
    }

    #[test]
    fn adjustment_uses_the_resolved_snapshot_and_variant_sku() {
        let store_id = StoreId::new();
        let product = product(store_id);

        let draft = build_adjustment(
            &product,
            Some("Red/L"),
            store_id,
            20,
            Some("recount".to_string()),
            None,
        )
        .unwrap();

        assert_eq!(draft.previous_quantity, 12);
        assert_eq!(draft.sku.as_deref(), Some("SHIRT-RED-L"));
        let delta = draft.delta().unwrap();
        assert_eq!(delta, quantity_delta(12, 20));
    }

    #[test]
    fn adjustment_without_reason_is_blocked_before_any_remote_call() {
        let store_id = StoreId::new();
        let product = product(store_id);

        let err =
            build_adjustment(&product, None, store_id, 70, None, None).unwrap_err();
        assert!(matches!(err, EngineError::ReasonRequired(_)));
    }

    #[test]
    fn transfer_snapshots_the_source_store() {
        let from = StoreId::new();
        let to = StoreId::new();
        let product = product(from);

        let draft = build_transfer(&product, None, from, to, 5, None, None).unwrap();
        assert_eq!(draft.previous_quantity, 50);
        assert_eq!(draft.sku.as_deref(), Some("SHIRT"));
    }

    #[test]
    fn transfer_to_the_same_store_is_rejected() {
        let store_id = StoreId::new();
        let product = product(store_id);

        let err =
            build_transfer(&product, None, store_id, store_id, 5, None, None).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }
}
