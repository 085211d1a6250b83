use serde::{Deserialize, Serialize};

use stockflow_core::{ProductId, StoreId, VariantId};

/// Populated store reference as emitted by endpoints that join the store in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreRecord {
    pub id: StoreId,
    #[serde(default)]
    pub name: Option<String>,
}

/// A store reference inside a per-store stock entry.
///
/// Depending on which upstream endpoint produced the record this is either a
/// raw store id or a populated store object; comparisons go through
/// [`StoreRef::store_id`] in both cases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoreRef {
    Id(StoreId),
    Record(StoreRecord),
}

impl StoreRef {
    pub fn store_id(&self) -> StoreId {
        match self {
            StoreRef::Id(id) => *id,
            StoreRef::Record(record) => record.id,
        }
    }
}

/// One per-store stock line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStockEntry {
    pub store: StoreRef,
    pub quantity: i64,
}

/// Wrapper object some endpoints ship instead of a bare entry list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedStoreStocks {
    pub store_wise_stock: Vec<StoreStockEntry>,
}

/// Per-store stock as shipped by the upstream system: a bare list of entries
/// or a wrapper object holding the list under a nested key.
///
/// The tagged-union parse replaces ad hoc shape probing; [`StoreStocks::entries`]
/// is the single normalization feeding every downstream search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoreStocks {
    List(Vec<StoreStockEntry>),
    Wrapped(WrappedStoreStocks),
}

impl StoreStocks {
    /// Normalize both shapes into one list.
    pub fn entries(&self) -> &[StoreStockEntry] {
        match self {
            StoreStocks::List(entries) => entries,
            StoreStocks::Wrapped(wrapped) => &wrapped.store_wise_stock,
        }
    }

    /// Quantity of the entry whose store reference matches `store_id`.
    pub fn quantity_for(&self, store_id: StoreId) -> Option<i64> {
        self.entries()
            .iter()
            .find(|entry| entry.store.store_id() == store_id)
            .map(|entry| entry.quantity)
    }
}

impl Default for StoreStocks {
    fn default() -> Self {
        StoreStocks::List(Vec::new())
    }
}

/// A product variant (attribute combination) with its own SKU and stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantRecord {
    #[serde(default)]
    pub id: Option<VariantId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub stocks: StoreStocks,
}

impl VariantRecord {
    /// Variant selection matches on title or on value.
    pub fn matches(&self, selector: &str) -> bool {
        self.title.as_deref() == Some(selector) || self.value.as_deref() == Some(selector)
    }
}

/// An upstream product inventory record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    /// Aggregate quantity across stores; last-resort fallback only.
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub stocks: StoreStocks,
    #[serde(default)]
    pub variants: Vec<VariantRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_list_shape() {
        let store_id = StoreId::new();
        let json = format!(
            r#"[{{ "store": "{store_id}", "quantity": 12 }}]"#
        );
        let stocks: StoreStocks = serde_json::from_str(&json).unwrap();
        assert_eq!(stocks.entries().len(), 1);
        assert_eq!(stocks.quantity_for(store_id), Some(12));
    }

    #[test]
    fn parses_wrapped_shape() {
        let store_id = StoreId::new();
        let json = format!(
            r#"{{ "store_wise_stock": [{{ "store": "{store_id}", "quantity": 7 }}] }}"#
        );
        let stocks: StoreStocks = serde_json::from_str(&json).unwrap();
        assert_eq!(stocks.entries().len(), 1);
        assert_eq!(stocks.quantity_for(store_id), Some(7));
    }

    #[test]
    fn store_ref_compares_by_extracted_id() {
        let store_id = StoreId::new();
        let raw = StoreRef::Id(store_id);
        let populated = StoreRef::Record(StoreRecord {
            id: store_id,
            name: Some("Main Warehouse".to_string()),
        });
        assert_eq!(raw.store_id(), populated.store_id());
    }

    #[test]
    fn parses_populated_store_reference() {
        let store_id = StoreId::new();
        let json = format!(
            r#"[{{ "store": {{ "id": "{store_id}", "name": "Outlet" }}, "quantity": 3 }}]"#
        );
        let stocks: StoreStocks = serde_json::from_str(&json).unwrap();
        assert_eq!(stocks.quantity_for(store_id), Some(3));
    }

    #[test]
    fn missing_stock_fields_default_to_empty() {
        let product_id = ProductId::new();
        let json = format!(r#"{{ "id": "{product_id}", "name": "Bare" }}"#);
        let product: ProductRecord = serde_json::from_str(&json).unwrap();
        assert!(product.stocks.entries().is_empty());
        assert!(product.variants.is_empty());
        assert_eq!(product.quantity, None);
    }

    #[test]
    fn variant_matches_on_title_or_value() {
        let variant = VariantRecord {
            id: Some(VariantId::new()),
            title: Some("Red/L".to_string()),
            value: Some("red-large".to_string()),
            sku: None,
            stocks: StoreStocks::default(),
        };
        assert!(variant.matches("Red/L"));
        assert!(variant.matches("red-large"));
        assert!(!variant.matches("Blue/S"));
    }
}
