//! Previous-quantity reconciliation.

use stockflow_core::StoreId;

use crate::records::{ProductRecord, VariantRecord};

/// Resolved stock line: the previous-quantity snapshot plus the SKU the line
/// should carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLine {
    pub quantity: i64,
    pub sku: Option<String>,
}

/// Resolve the previous quantity for a product/variant/store combination.
///
/// Precedence, first match wins (the order is load-bearing):
/// 1. the selected variant's per-store entry for the target store;
/// 2. the product's own store-wise entry, but only when no caller-supplied
///    quantity was given;
/// 3. the caller-supplied quantity, else the product's aggregate quantity,
///    else 0.
///
/// The SKU is noted from the matched variant when one is selected, falling
/// back to the product's SKU.
pub fn resolve_previous_quantity(
    product: &ProductRecord,
    variant_selector: Option<&str>,
    store_id: StoreId,
    caller_supplied: Option<i64>,
) -> ResolvedLine {
    let variant = variant_selector.and_then(|selector| find_variant(product, selector));

    let sku = variant
        .and_then(|v| v.sku.clone())
        .or_else(|| product.sku.clone());

    if let Some(variant) = variant {
        if let Some(quantity) = variant.stocks.quantity_for(store_id) {
            return ResolvedLine { quantity, sku };
        }
    }

    if caller_supplied.is_none() {
        if let Some(quantity) = product.stocks.quantity_for(store_id) {
            return ResolvedLine { quantity, sku };
        }
    }

    let quantity = caller_supplied.or(product.quantity).unwrap_or(0);
    ResolvedLine { quantity, sku }
}

fn find_variant<'a>(product: &'a ProductRecord, selector: &str) -> Option<&'a VariantRecord> {
    product.variants.iter().find(|v| v.matches(selector))
}
