use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use stockflow_catalog::{
    ProductRecord, StoreRecord, StoreRef, StoreStockEntry, StoreStocks, VariantRecord,
    resolve_previous_quantity,
};
use stockflow_core::{ProductId, StoreId, VariantId};

fn product_with_variants(variant_count: usize, stores_per_variant: usize) -> (ProductRecord, StoreId) {
    let target_store = StoreId::new();

    let variants = (0..variant_count)
        .map(|i| {
            let mut entries: Vec<StoreStockEntry> = (0..stores_per_variant.saturating_sub(1))
                .map(|_| StoreStockEntry {
                    store: StoreRef::Id(StoreId::new()),
                    quantity: 5,
                })
                .collect();
            // Target store entry goes last so the search has to scan.
            entries.push(StoreStockEntry {
                store: StoreRef::Record(StoreRecord {
                    id: target_store,
                    name: Some("Main".to_string()),
                }),
                quantity: 42,
            });

            VariantRecord {
                id: Some(VariantId::new()),
                title: Some(format!("Variant-{i}")),
                value: None,
                sku: Some(format!("SKU-{i}")),
                stocks: StoreStocks::Wrapped(stockflow_catalog::WrappedStoreStocks {
                    store_wise_stock: entries,
                }),
            }
        })
        .collect();

    let product = ProductRecord {
        id: ProductId::new(),
        name: "Bench Product".to_string(),
        sku: Some("BENCH".to_string()),
        quantity: Some(99),
        stocks: StoreStocks::default(),
        variants,
    };

    (product, target_store)
}

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("previous_quantity_resolution");

    for variant_count in [4usize, 32, 256] {
        let (product, store_id) = product_with_variants(variant_count, 8);
        let selector = format!("Variant-{}", variant_count - 1);

        group.bench_with_input(
            BenchmarkId::new("worst_case_variant", variant_count),
            &variant_count,
            |b, _| {
                b.iter(|| {
                    resolve_previous_quantity(
                        black_box(&product),
                        black_box(Some(selector.as_str())),
                        black_box(store_id),
                        None,
                    )
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_resolution);
criterion_main!(benches);
