//! Stock-bounded cart mutations.

use common::{BranchId, Money, ProductId, Version};
use store::{DocumentStore, StoreError};

use crate::codec::{decode, encode};
use crate::error::{DomainError, Result};
use crate::stock::{MAX_CAS_RETRIES, StockLedger};

use super::{CART_COLLECTION, Cart, CartLine, CartOwner};

/// Prices for a line that does not exist in the cart yet.
#[derive(Debug, Clone, Copy)]
pub struct LinePricing {
    pub unit_price: Money,
    pub discount_price: Option<Money>,
}

/// A request to change one line's quantity by a signed delta.
#[derive(Debug, Clone)]
pub struct AdjustLine {
    pub product_id: ProductId,
    pub branch_id: BranchId,
    pub delta: i64,

    /// Required when the adjustment creates a new line; ignored (existing
    /// prices are kept) when the line is already in the cart.
    pub pricing: Option<LinePricing>,
}

/// A merged line whose quantity was capped at available stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClampedLine {
    pub product_id: ProductId,
    pub requested: u32,
    pub kept: u32,
}

/// Result of merging an anonymous cart into a persisted one.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub cart: Cart,
    /// Lines whose merged quantity was silently capped, for user notice.
    pub clamped: Vec<ClampedLine>,
}

/// Cart operations. Each mutation re-reads stock and commits the cart under
/// its document version, retrying a bounded number of times on lost races.
#[derive(Clone)]
pub struct CartService<S: DocumentStore + Clone> {
    store: S,
    ledger: StockLedger<S>,
}

impl<S: DocumentStore + Clone> CartService<S> {
    /// Creates a cart service over the given store.
    pub fn new(store: S) -> Self {
        let ledger = StockLedger::new(store.clone());
        Self { store, ledger }
    }

    /// Returns the owner's cart, or an empty one if none is persisted.
    pub async fn get(&self, owner: &CartOwner) -> Result<Cart> {
        Ok(self
            .load(owner)
            .await?
            .map(|(cart, _)| cart)
            .unwrap_or_else(|| Cart::empty(owner.clone())))
    }

    /// Deletes the owner's cart document, if any.
    pub async fn clear(&self, owner: &CartOwner) -> Result<()> {
        self.store.delete(CART_COLLECTION, &owner.key()).await?;
        Ok(())
    }

    /// Changes one line's quantity by `delta`, bounded by available stock.
    ///
    /// A resulting quantity of zero or less removes the line. The whole
    /// adjustment is all-or-nothing: a rejection leaves the cart unchanged.
    #[tracing::instrument(skip(self))]
    pub async fn adjust_line(&self, owner: &CartOwner, req: AdjustLine) -> Result<Cart> {
        if req.delta == 0 {
            return self.get(owner).await;
        }

        for _ in 0..MAX_CAS_RETRIES {
            let (mut cart, version) = match self.load(owner).await? {
                Some((cart, version)) => (cart, Some(version)),
                None => (Cart::empty(owner.clone()), None),
            };

            self.apply_adjustment(&mut cart, &req).await?;

            match self.save(&cart, version).await {
                Ok(()) => {
                    metrics::counter!("cart_adjustments_total").increment(1);
                    return Ok(cart);
                }
                Err(SaveRace::Lost) => continue,
                Err(SaveRace::Other(e)) => return Err(e),
            }
        }

        Err(DomainError::Conflict(format!("carts/{}", owner.key())))
    }

    /// Merges a local (anonymous) cart into a persisted one, summing
    /// quantities per product and silently clamping at available stock.
    ///
    /// A single line's overflow never fails the merge; clamped lines are
    /// reported in the outcome. The local cart is deleted on success.
    #[tracing::instrument(skip(self))]
    pub async fn merge_carts(
        &self,
        local: &CartOwner,
        persisted: &CartOwner,
    ) -> Result<MergeOutcome> {
        let Some((local_cart, _)) = self.load(local).await? else {
            return Ok(MergeOutcome {
                cart: self.get(persisted).await?,
                clamped: Vec::new(),
            });
        };
        if local_cart.is_empty() {
            self.clear(local).await?;
            return Ok(MergeOutcome {
                cart: self.get(persisted).await?,
                clamped: Vec::new(),
            });
        }

        for _ in 0..MAX_CAS_RETRIES {
            let (mut cart, version) = match self.load(persisted).await? {
                Some((cart, version)) => (cart, Some(version)),
                None => (Cart::empty(persisted.clone()), None),
            };

            if let (Some(have), Some(incoming)) = (cart.branch_id, local_cart.branch_id)
                && have != incoming
            {
                return Err(DomainError::BranchMismatch {
                    cart_branch: have,
                    requested: incoming,
                });
            }
            if cart.branch_id.is_none() {
                cart.branch_id = local_cart.branch_id;
            }
            let Some(branch_id) = cart.branch_id else {
                // Both carts empty of lines; nothing to merge.
                return Ok(MergeOutcome {
                    cart,
                    clamped: Vec::new(),
                });
            };

            let mut clamped = Vec::new();
            for incoming in &local_cart.lines {
                let requested = cart.quantity_of(&incoming.product_id) + incoming.quantity;
                let available = self
                    .ledger
                    .available(&incoming.product_id, &branch_id)
                    .await?
                    .unwrap_or(0);

                let kept = requested.min(available);
                if kept < requested {
                    clamped.push(ClampedLine {
                        product_id: incoming.product_id.clone(),
                        requested,
                        kept,
                    });
                }

                if kept == 0 {
                    cart.remove_line(&incoming.product_id);
                    continue;
                }

                // Keep the persisted line's prices when both carts hold the
                // product; otherwise take the incoming line's.
                let merged = match cart.line(&incoming.product_id) {
                    Some(existing) => CartLine {
                        quantity: kept,
                        ..existing.clone()
                    },
                    None => CartLine {
                        quantity: kept,
                        ..incoming.clone()
                    },
                };
                cart.set_line(merged);
            }

            match self.save(&cart, version).await {
                Ok(()) => {
                    self.clear(local).await?;
                    metrics::counter!("cart_merges_total").increment(1);
                    return Ok(MergeOutcome { cart, clamped });
                }
                Err(SaveRace::Lost) => continue,
                Err(SaveRace::Other(e)) => return Err(e),
            }
        }

        Err(DomainError::Conflict(format!("carts/{}", persisted.key())))
    }

    async fn apply_adjustment(&self, cart: &mut Cart, req: &AdjustLine) -> Result<()> {
        match cart.branch_id {
            None => cart.branch_id = Some(req.branch_id),
            Some(branch) if branch != req.branch_id => {
                return Err(DomainError::BranchMismatch {
                    cart_branch: branch,
                    requested: req.branch_id,
                });
            }
            Some(_) => {}
        }

        let target = i64::from(cart.quantity_of(&req.product_id))
            .checked_add(req.delta)
            .ok_or_else(|| DomainError::Validation("line quantity out of range".to_string()))?;
        if target <= 0 {
            cart.remove_line(&req.product_id);
            return Ok(());
        }
        let target = u32::try_from(target)
            .map_err(|_| DomainError::Validation("line quantity out of range".to_string()))?;

        let available = self
            .ledger
            .available(&req.product_id, &req.branch_id)
            .await?
            .ok_or_else(|| DomainError::NotFound {
                entity: "stock entry",
                id: format!("{}:{}", req.product_id, req.branch_id),
            })?;
        if target > available {
            return Err(DomainError::InsufficientStock {
                product_id: req.product_id.clone(),
                available,
            });
        }

        let line = match cart.line(&req.product_id) {
            Some(existing) => CartLine {
                quantity: target,
                ..existing.clone()
            },
            None => {
                let pricing = req.pricing.ok_or_else(|| {
                    DomainError::Validation(format!(
                        "unit price required to add {} to the cart",
                        req.product_id
                    ))
                })?;
                CartLine {
                    product_id: req.product_id.clone(),
                    quantity: target,
                    unit_price: pricing.unit_price,
                    discount_price: pricing.discount_price,
                }
            }
        };
        cart.set_line(line);
        Ok(())
    }

    pub(crate) async fn load(&self, owner: &CartOwner) -> Result<Option<(Cart, Version)>> {
        match self.store.get(CART_COLLECTION, &owner.key()).await? {
            Some(doc) => {
                let cart: Cart = decode(&doc)?;
                Ok(Some((cart, doc.version)))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, cart: &Cart, version: Option<Version>) -> std::result::Result<(), SaveRace> {
        let payload = encode(cart).map_err(SaveRace::Other)?;
        let key = cart.owner.key();

        let result = match version {
            Some(version) => self
                .store
                .update(CART_COLLECTION, &key, version, payload)
                .await
                .map(|_| ()),
            None => self
                .store
                .put_new(CART_COLLECTION, &key, payload)
                .await
                .map(|_| ()),
        };

        match result {
            Ok(()) => Ok(()),
            Err(StoreError::ConcurrencyConflict { .. }) | Err(StoreError::AlreadyExists { .. }) => {
                Err(SaveRace::Lost)
            }
            Err(e) => Err(SaveRace::Other(e.into())),
        }
    }
}

enum SaveRace {
    Lost,
    Other(DomainError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stock::StockEntry;
    use store::InMemoryDocumentStore;

    fn pricing(cents: i64) -> Option<LinePricing> {
        Some(LinePricing {
            unit_price: Money::from_cents(cents),
            discount_price: None,
        })
    }

    async fn setup(quantity: u32) -> (CartService<InMemoryDocumentStore>, ProductId, BranchId) {
        let store = InMemoryDocumentStore::new();
        let service = CartService::new(store.clone());
        let product = ProductId::new("SKU-001");
        let branch = BranchId::new();
        StockLedger::new(store)
            .set(StockEntry {
                product_id: product.clone(),
                branch_id: branch,
                quantity,
            })
            .await
            .unwrap();
        (service, product, branch)
    }

    fn adjust(product: &ProductId, branch: BranchId, delta: i64) -> AdjustLine {
        AdjustLine {
            product_id: product.clone(),
            branch_id: branch,
            delta,
            pricing: pricing(1000),
        }
    }

    #[tokio::test]
    async fn add_within_stock_succeeds() {
        let (service, product, branch) = setup(5).await;
        let owner = CartOwner::Anonymous("tok".into());

        let cart = service
            .adjust_line(&owner, adjust(&product, branch, 3))
            .await
            .unwrap();

        assert_eq!(cart.quantity_of(&product), 3);
        assert_eq!(cart.branch_id, Some(branch));
        assert_eq!(cart.total().cents(), 3000);
    }

    #[tokio::test]
    async fn second_add_beyond_stock_is_rejected_and_cart_unchanged() {
        // Scenario A from the fulfillment contract: stock 5, +3 then +3.
        let (service, product, branch) = setup(5).await;
        let owner = CartOwner::Anonymous("tok".into());

        service
            .adjust_line(&owner, adjust(&product, branch, 3))
            .await
            .unwrap();
        let result = service.adjust_line(&owner, adjust(&product, branch, 3)).await;

        assert!(matches!(
            result,
            Err(DomainError::InsufficientStock { available: 5, .. })
        ));
        let cart = service.get(&owner).await.unwrap();
        assert_eq!(cart.quantity_of(&product), 3);
    }

    #[tokio::test]
    async fn negative_delta_to_zero_removes_line() {
        let (service, product, branch) = setup(5).await;
        let owner = CartOwner::Anonymous("tok".into());

        service
            .adjust_line(&owner, adjust(&product, branch, 3))
            .await
            .unwrap();
        let cart = service
            .adjust_line(&owner, adjust(&product, branch, -3))
            .await
            .unwrap();

        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn branch_mismatch_is_rejected() {
        let (service, product, branch) = setup(5).await;
        let owner = CartOwner::Anonymous("tok".into());
        service
            .adjust_line(&owner, adjust(&product, branch, 1))
            .await
            .unwrap();

        let other_branch = BranchId::new();
        let result = service
            .adjust_line(&owner, adjust(&product, other_branch, 1))
            .await;

        assert!(matches!(result, Err(DomainError::BranchMismatch { .. })));
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let (service, _, branch) = setup(5).await;
        let owner = CartOwner::Anonymous("tok".into());
        let ghost = ProductId::new("SKU-404");

        let result = service.adjust_line(&owner, adjust(&ghost, branch, 1)).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn extreme_delta_is_rejected_and_cart_unchanged() {
        let (service, product, branch) = setup(5).await;
        let owner = CartOwner::Anonymous("tok".into());
        service
            .adjust_line(&owner, adjust(&product, branch, 2))
            .await
            .unwrap();

        for delta in [i64::MAX, i64::MAX - 1] {
            let result = service.adjust_line(&owner, adjust(&product, branch, delta)).await;
            assert!(matches!(result, Err(DomainError::Validation(_))));
        }

        let cart = service.get(&owner).await.unwrap();
        assert_eq!(cart.quantity_of(&product), 2);
    }

    #[tokio::test]
    async fn new_line_without_pricing_is_invalid() {
        let (service, product, branch) = setup(5).await;
        let owner = CartOwner::Anonymous("tok".into());

        let mut req = adjust(&product, branch, 1);
        req.pricing = None;
        let result = service.adjust_line(&owner, req).await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn existing_line_keeps_its_prices() {
        let (service, product, branch) = setup(10).await;
        let owner = CartOwner::Anonymous("tok".into());

        service
            .adjust_line(&owner, adjust(&product, branch, 2))
            .await
            .unwrap();
        let mut bump = adjust(&product, branch, 1);
        bump.pricing = pricing(9999); // must be ignored
        let cart = service.adjust_line(&owner, bump).await.unwrap();

        assert_eq!(cart.line(&product).unwrap().unit_price.cents(), 1000);
        assert_eq!(cart.quantity_of(&product), 3);
    }

    #[tokio::test]
    async fn merge_sums_quantities_and_clamps_at_stock() {
        let (service, product, branch) = setup(5).await;
        let anon = CartOwner::Anonymous("anon-tok".into());
        let user = CartOwner::User(common::CustomerId::new());

        service
            .adjust_line(&anon, adjust(&product, branch, 4))
            .await
            .unwrap();
        service
            .adjust_line(&user, adjust(&product, branch, 3))
            .await
            .unwrap();

        let outcome = service.merge_carts(&anon, &user).await.unwrap();

        // 4 + 3 = 7 requested, clamped to the 5 in stock
        assert_eq!(outcome.cart.quantity_of(&product), 5);
        assert_eq!(
            outcome.clamped,
            vec![ClampedLine {
                product_id: product.clone(),
                requested: 7,
                kept: 5,
            }]
        );

        // Local cart is gone after the merge
        let local = service.get(&anon).await.unwrap();
        assert!(local.is_empty());
    }

    #[tokio::test]
    async fn merge_without_overflow_reports_nothing_clamped() {
        let (service, product, branch) = setup(10).await;
        let anon = CartOwner::Anonymous("anon-tok".into());
        let user = CartOwner::User(common::CustomerId::new());

        service
            .adjust_line(&anon, adjust(&product, branch, 2))
            .await
            .unwrap();
        service
            .adjust_line(&user, adjust(&product, branch, 3))
            .await
            .unwrap();

        let outcome = service.merge_carts(&anon, &user).await.unwrap();
        assert_eq!(outcome.cart.quantity_of(&product), 5);
        assert!(outcome.clamped.is_empty());
    }

    #[tokio::test]
    async fn merge_with_no_local_cart_is_a_noop() {
        let (service, product, branch) = setup(5).await;
        let anon = CartOwner::Anonymous("never-used".into());
        let user = CartOwner::User(common::CustomerId::new());
        service
            .adjust_line(&user, adjust(&product, branch, 2))
            .await
            .unwrap();

        let outcome = service.merge_carts(&anon, &user).await.unwrap();
        assert_eq!(outcome.cart.quantity_of(&product), 2);
        assert!(outcome.clamped.is_empty());
    }

    #[tokio::test]
    async fn merge_across_branches_is_rejected() {
        let store = InMemoryDocumentStore::new();
        let service = CartService::new(store.clone());
        let ledger = StockLedger::new(store);
        let product = ProductId::new("SKU-001");
        let (branch_a, branch_b) = (BranchId::new(), BranchId::new());
        for branch in [branch_a, branch_b] {
            ledger
                .set(StockEntry {
                    product_id: product.clone(),
                    branch_id: branch,
                    quantity: 5,
                })
                .await
                .unwrap();
        }

        let anon = CartOwner::Anonymous("anon-tok".into());
        let user = CartOwner::User(common::CustomerId::new());
        service
            .adjust_line(&anon, adjust(&product, branch_a, 1))
            .await
            .unwrap();
        service
            .adjust_line(&user, adjust(&product, branch_b, 1))
            .await
            .unwrap();

        let result = service.merge_carts(&anon, &user).await;
        assert!(matches!(result, Err(DomainError::BranchMismatch { .. })));
    }

    #[tokio::test]
    async fn quantity_never_exceeds_stock_over_any_adjustment_sequence() {
        let (service, product, branch) = setup(4).await;
        let owner = CartOwner::Anonymous("tok".into());

        for delta in [2i64, 3, -1, 1, 5, -2, 4, 1, 1, -10, 3] {
            let _ = service
                .adjust_line(&owner, adjust(&product, branch, delta))
                .await;
            let cart = service.get(&owner).await.unwrap();
            assert!(cart.quantity_of(&product) <= 4);
        }
    }
}
