//! Upstream catalog records and quantity reconciliation.
//!
//! Inventory records in the upstream system are populated inconsistently
//! (bare list vs wrapper object, raw id vs populated store reference)
//! depending on which endpoint produced them. This crate parses those shapes
//! into tagged unions, normalizes them once, and resolves the authoritative
//! previous quantity for a product/variant/store combination.

pub mod records;
pub mod resolver;

pub use records::{
    ProductRecord, StoreRecord, StoreRef, StoreStockEntry, StoreStocks, VariantRecord,
    WrappedStoreStocks,
};
pub use resolver::{ResolvedLine, resolve_previous_quantity};
