use common::{BranchId, Money, ProductId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{AdjustLine, CartOwner, CartService, LinePricing, StockEntry, StockLedger};
use store::InMemoryDocumentStore;
use tokio::runtime::Runtime;

fn bench_cart_adjustments(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let store = InMemoryDocumentStore::new();
    let service = CartService::new(store.clone());
    let product = ProductId::new("SKU-001");
    let branch = BranchId::new();
    rt.block_on(async {
        StockLedger::new(store)
            .set(StockEntry {
                product_id: product.clone(),
                branch_id: branch,
                quantity: u32::MAX,
            })
            .await
            .unwrap();
    });

    c.bench_function("cart_adjust_line", |b| {
        b.to_async(&rt).iter(|| {
            let service = service.clone();
            let product = product.clone();
            let owner = CartOwner::Anonymous("bench".into());
            async move {
                service
                    .adjust_line(
                        &owner,
                        AdjustLine {
                            product_id: product,
                            branch_id: branch,
                            delta: 1,
                            pricing: Some(LinePricing {
                                unit_price: Money::from_cents(1000),
                                discount_price: None,
                            }),
                        },
                    )
                    .await
                    .unwrap()
            }
        })
    });
}

fn bench_stock_take(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let store = InMemoryDocumentStore::new();
    let ledger = StockLedger::new(store);
    let product = ProductId::new("SKU-001");
    let branch = BranchId::new();
    rt.block_on(async {
        ledger
            .set(StockEntry {
                product_id: product.clone(),
                branch_id: branch,
                quantity: u32::MAX,
            })
            .await
            .unwrap();
    });

    c.bench_function("stock_try_take", |b| {
        b.to_async(&rt).iter(|| {
            let ledger = ledger.clone();
            let product = product.clone();
            async move { ledger.try_take(&product, &branch, 1).await.unwrap() }
        })
    });
}

criterion_group!(benches, bench_cart_adjustments, bench_stock_take);
criterion_main!(benches);
