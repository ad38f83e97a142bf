//! Cart-to-order conversion.
//!
//! Checkout is all-or-nothing: stock is taken per line before the order is
//! written, and every taken unit is given back if any later step fails.

use chrono::{DateTime, Utc};
use common::OrderId;
use store::DocumentStore;

use crate::cart::{Cart, CartOwner, CartService};
use crate::codec::encode;
use crate::error::{DomainError, Result};
use crate::order::{
    CustomerInfo, Delivery, DeliveryMethod, ORDER_COLLECTION, Order, OrderLine, OrderStatus,
    Payment, PaymentStatus,
};
use crate::stock::StockLedger;

/// Customer-supplied details collected at checkout time.
#[derive(Debug, Clone)]
pub struct CheckoutDetails {
    pub customer: CustomerInfo,
    pub method: DeliveryMethod,
    pub slot: String,
    pub address: String,
}

/// Freezes a cart into an order snapshot.
///
/// Pure: no stock is consumed here. Lines are priced at their effective
/// price (discount applied) and the payment amount is the cart total, so
/// later catalog changes never move the order.
pub fn freeze(
    cart: &Cart,
    details: &CheckoutDetails,
    id: OrderId,
    now: DateTime<Utc>,
) -> Result<Order> {
    if cart.is_empty() {
        return Err(DomainError::Validation("cart is empty".to_string()));
    }
    let branch_id = cart
        .branch_id
        .ok_or_else(|| DomainError::Validation("cart has no branch".to_string()))?;

    let products = cart
        .lines
        .iter()
        .map(|line| OrderLine {
            product_id: line.product_id.clone(),
            quantity: line.quantity,
            unit_price: line.effective_price(),
        })
        .collect::<Vec<_>>();
    let amount = products
        .iter()
        .map(|l| l.unit_price.multiply(l.quantity))
        .sum();

    Ok(Order {
        id,
        status: OrderStatus::Pending,
        created_at: now,
        customer: details.customer.clone(),
        branch_id,
        products,
        delivery: Delivery {
            method: details.method,
            slot: details.slot.clone(),
            address: details.address.clone(),
        },
        payment: Payment {
            transaction_id: None,
            amount,
            status: PaymentStatus::Pending,
        },
        logistics_ref: None,
    })
}

/// Converts carts into pending orders, consuming stock on the way.
#[derive(Clone)]
pub struct CheckoutService<S: DocumentStore + Clone> {
    store: S,
    carts: CartService<S>,
    ledger: StockLedger<S>,
}

impl<S: DocumentStore + Clone> CheckoutService<S> {
    /// Creates a checkout service over the given store.
    pub fn new(store: S) -> Self {
        let carts = CartService::new(store.clone());
        let ledger = StockLedger::new(store.clone());
        Self {
            store,
            carts,
            ledger,
        }
    }

    /// Places an order from the owner's cart.
    ///
    /// Takes stock per line, persists the pending order, then clears the
    /// cart. On any failure every unit already taken is returned, so a
    /// rejected checkout leaves stock and cart as they were.
    #[tracing::instrument(skip(self))]
    pub async fn checkout(&self, owner: &CartOwner, details: CheckoutDetails) -> Result<Order> {
        let cart = self.carts.get(owner).await?;
        let order = freeze(&cart, &details, OrderId::new(), Utc::now())?;

        let mut taken: Vec<&OrderLine> = Vec::with_capacity(order.products.len());
        for line in &order.products {
            match self
                .ledger
                .try_take(&line.product_id, &order.branch_id, line.quantity)
                .await
            {
                Ok(()) => taken.push(line),
                Err(e) => {
                    self.compensate(&order, &taken).await;
                    return Err(e);
                }
            }
        }

        if let Err(e) = self
            .store
            .put_new(ORDER_COLLECTION, &order.id.to_string(), encode(&order)?)
            .await
        {
            self.compensate(&order, &taken).await;
            return Err(e.into());
        }

        // The order exists at this point; a cart that fails to clear is an
        // annoyance, not a lost sale.
        if let Err(e) = self.carts.clear(owner).await {
            tracing::warn!(owner = %owner, error = %e, "failed to clear cart after checkout");
        }

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(order_id = %order.id, total = %order.payment.amount, "order placed");
        Ok(order)
    }

    async fn compensate(&self, order: &Order, taken: &[&OrderLine]) {
        for line in taken {
            if let Err(e) = self
                .ledger
                .give_back(&line.product_id, &order.branch_id, line.quantity)
                .await
            {
                tracing::error!(
                    product_id = %line.product_id,
                    quantity = line.quantity,
                    error = %e,
                    "failed to return stock after aborted checkout"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::{AdjustLine, LinePricing};
    use crate::stock::StockEntry;
    use common::{BranchId, Money, ProductId};
    use store::InMemoryDocumentStore;

    fn details() -> CheckoutDetails {
        CheckoutDetails {
            customer: CustomerInfo {
                customer_id: None,
                name: "Grace Hopper".to_string(),
                phone: "+1 555 0100".to_string(),
            },
            method: DeliveryMethod::Normal,
            slot: "2026-08-25 14:00-16:00".to_string(),
            address: "2 Harbor Road".to_string(),
        }
    }

    struct Fixture {
        store: InMemoryDocumentStore,
        checkout: CheckoutService<InMemoryDocumentStore>,
        carts: CartService<InMemoryDocumentStore>,
        ledger: StockLedger<InMemoryDocumentStore>,
        branch: BranchId,
    }

    async fn fixture() -> Fixture {
        let store = InMemoryDocumentStore::new();
        Fixture {
            checkout: CheckoutService::new(store.clone()),
            carts: CartService::new(store.clone()),
            ledger: StockLedger::new(store.clone()),
            branch: BranchId::new(),
            store,
        }
    }

    impl Fixture {
        async fn stock(&self, sku: &str, quantity: u32) -> ProductId {
            let product = ProductId::new(sku);
            self.ledger
                .set(StockEntry {
                    product_id: product.clone(),
                    branch_id: self.branch,
                    quantity,
                })
                .await
                .unwrap();
            product
        }

        async fn add(&self, owner: &CartOwner, product: &ProductId, quantity: i64, cents: i64) {
            self.carts
                .adjust_line(
                    owner,
                    AdjustLine {
                        product_id: product.clone(),
                        branch_id: self.branch,
                        delta: quantity,
                        pricing: Some(LinePricing {
                            unit_price: Money::from_cents(cents),
                            discount_price: None,
                        }),
                    },
                )
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn checkout_freezes_prices_takes_stock_and_clears_cart() {
        let f = fixture().await;
        let product = f.stock("SKU-001", 5).await;
        let owner = CartOwner::Anonymous("tok".into());
        f.add(&owner, &product, 3, 1200).await;

        let order = f.checkout.checkout(&owner, details()).await.unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.products.len(), 1);
        assert_eq!(order.products[0].quantity, 3);
        assert_eq!(order.products[0].unit_price.cents(), 1200);
        assert_eq!(order.payment.amount.cents(), 3600);
        assert_eq!(order.payment.status, PaymentStatus::Pending);

        assert_eq!(
            f.ledger.available(&product, &f.branch).await.unwrap(),
            Some(2)
        );
        assert!(f.carts.get(&owner).await.unwrap().is_empty());

        // The order is persisted, not just returned.
        let doc = f
            .store
            .get(ORDER_COLLECTION, &order.id.to_string())
            .await
            .unwrap()
            .unwrap();
        let stored: Order = doc.decode().unwrap();
        assert_eq!(stored, order);
    }

    #[tokio::test]
    async fn discounted_lines_freeze_at_the_discount_price() {
        let f = fixture().await;
        let product = f.stock("SKU-001", 5).await;
        let owner = CartOwner::Anonymous("tok".into());
        f.carts
            .adjust_line(
                &owner,
                AdjustLine {
                    product_id: product.clone(),
                    branch_id: f.branch,
                    delta: 2,
                    pricing: Some(LinePricing {
                        unit_price: Money::from_cents(1000),
                        discount_price: Some(Money::from_cents(800)),
                    }),
                },
            )
            .await
            .unwrap();

        let order = f.checkout.checkout(&owner, details()).await.unwrap();
        assert_eq!(order.products[0].unit_price.cents(), 800);
        assert_eq!(order.payment.amount.cents(), 1600);
    }

    #[tokio::test]
    async fn insufficient_stock_aborts_and_returns_taken_units() {
        let f = fixture().await;
        let plenty = f.stock("SKU-001", 10).await;
        let scarce = f.stock("SKU-002", 5).await;
        let owner = CartOwner::Anonymous("tok".into());
        f.add(&owner, &plenty, 4, 1000).await;
        f.add(&owner, &scarce, 4, 500).await;

        // Another shopper drains the scarce product between carting and
        // checkout.
        f.ledger.try_take(&scarce, &f.branch, 3).await.unwrap();

        let result = f.checkout.checkout(&owner, details()).await;
        assert!(matches!(
            result,
            Err(DomainError::InsufficientStock { available: 2, .. })
        ));

        // Compensation returned the plenty units; nothing was lost.
        assert_eq!(
            f.ledger.available(&plenty, &f.branch).await.unwrap(),
            Some(10)
        );
        assert_eq!(
            f.ledger.available(&scarce, &f.branch).await.unwrap(),
            Some(2)
        );
        // Cart survives a failed checkout.
        assert_eq!(f.carts.get(&owner).await.unwrap().quantity_of(&plenty), 4);
    }

    #[tokio::test]
    async fn empty_cart_cannot_check_out() {
        let f = fixture().await;
        let owner = CartOwner::Anonymous("tok".into());

        let result = f.checkout.checkout(&owner, details()).await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn freeze_rejects_cart_without_branch() {
        let cart = Cart::empty(CartOwner::Anonymous("tok".into()));
        let result = freeze(&cart, &details(), OrderId::new(), Utc::now());
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }
}
