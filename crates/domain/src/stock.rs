//! Per (product, branch) available-quantity ledger.
//!
//! Quantities only change through conditional writes against the stock
//! document's version, so two concurrent takers can never both succeed
//! against the same read.

use common::{BranchId, ProductId};
use serde::{Deserialize, Serialize};
use store::{DocumentStore, StoreError};

use crate::codec::{decode, encode};
use crate::error::{DomainError, Result};

/// Collection holding stock documents.
pub const STOCK_COLLECTION: &str = "stock";

/// Bounded retry count for compare-and-set loops.
pub(crate) const MAX_CAS_RETRIES: usize = 5;

/// Available quantity of one product at one branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockEntry {
    pub product_id: ProductId,
    pub branch_id: BranchId,
    pub quantity: u32,
}

/// Document key for a (product, branch) pair.
pub fn stock_key(product_id: &ProductId, branch_id: &BranchId) -> String {
    format!("{product_id}:{branch_id}")
}

/// Source of truth for available stock.
#[derive(Clone)]
pub struct StockLedger<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> StockLedger<S> {
    /// Creates a ledger over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the available quantity, or `None` if the (product, branch)
    /// pair has never been stocked.
    pub async fn available(
        &self,
        product_id: &ProductId,
        branch_id: &BranchId,
    ) -> Result<Option<u32>> {
        let key = stock_key(product_id, branch_id);
        match self.store.get(STOCK_COLLECTION, &key).await? {
            Some(doc) => {
                let entry: StockEntry = decode(&doc)?;
                Ok(Some(entry.quantity))
            }
            None => Ok(None),
        }
    }

    /// Sets the absolute quantity for a (product, branch) pair.
    ///
    /// Administrative seeding; creates the entry if missing.
    #[tracing::instrument(skip(self))]
    pub async fn set(&self, entry: StockEntry) -> Result<()> {
        let key = stock_key(&entry.product_id, &entry.branch_id);
        let payload = encode(&entry)?;

        for _ in 0..MAX_CAS_RETRIES {
            match self.store.get(STOCK_COLLECTION, &key).await? {
                Some(doc) => {
                    match self
                        .store
                        .update(STOCK_COLLECTION, &key, doc.version, payload.clone())
                        .await
                    {
                        Ok(_) => return Ok(()),
                        Err(StoreError::ConcurrencyConflict { .. }) => continue,
                        Err(e) => return Err(e.into()),
                    }
                }
                None => match self
                    .store
                    .put_new(STOCK_COLLECTION, &key, payload.clone())
                    .await
                {
                    Ok(_) => return Ok(()),
                    Err(StoreError::AlreadyExists { .. }) => continue,
                    Err(e) => return Err(e.into()),
                },
            }
        }

        Err(DomainError::Conflict(format!("stock/{key}")))
    }

    /// Atomically removes `quantity` units from the ledger.
    ///
    /// Rejects with [`DomainError::InsufficientStock`] when the branch does
    /// not hold enough, and with [`DomainError::NotFound`] when the pair has
    /// never been stocked. Retries a bounded number of times on lost races.
    #[tracing::instrument(skip(self))]
    pub async fn try_take(
        &self,
        product_id: &ProductId,
        branch_id: &BranchId,
        quantity: u32,
    ) -> Result<()> {
        let key = stock_key(product_id, branch_id);

        for _ in 0..MAX_CAS_RETRIES {
            let doc = self
                .store
                .get(STOCK_COLLECTION, &key)
                .await?
                .ok_or_else(|| DomainError::NotFound {
                    entity: "stock entry",
                    id: key.clone(),
                })?;
            let mut entry: StockEntry = decode(&doc)?;

            if quantity > entry.quantity {
                return Err(DomainError::InsufficientStock {
                    product_id: product_id.clone(),
                    available: entry.quantity,
                });
            }
            entry.quantity -= quantity;

            match self
                .store
                .update(STOCK_COLLECTION, &key, doc.version, encode(&entry)?)
                .await
            {
                Ok(_) => return Ok(()),
                Err(StoreError::ConcurrencyConflict { .. }) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(DomainError::Conflict(format!("stock/{key}")))
    }

    /// Returns previously taken units to the ledger.
    ///
    /// Compensation path for a failed checkout; creates the entry if it has
    /// vanished so stock is never silently lost.
    #[tracing::instrument(skip(self))]
    pub async fn give_back(
        &self,
        product_id: &ProductId,
        branch_id: &BranchId,
        quantity: u32,
    ) -> Result<()> {
        let key = stock_key(product_id, branch_id);

        for _ in 0..MAX_CAS_RETRIES {
            match self.store.get(STOCK_COLLECTION, &key).await? {
                Some(doc) => {
                    let mut entry: StockEntry = decode(&doc)?;
                    entry.quantity += quantity;
                    match self
                        .store
                        .update(STOCK_COLLECTION, &key, doc.version, encode(&entry)?)
                        .await
                    {
                        Ok(_) => return Ok(()),
                        Err(StoreError::ConcurrencyConflict { .. }) => continue,
                        Err(e) => return Err(e.into()),
                    }
                }
                None => {
                    let entry = StockEntry {
                        product_id: product_id.clone(),
                        branch_id: *branch_id,
                        quantity,
                    };
                    match self
                        .store
                        .put_new(STOCK_COLLECTION, &key, encode(&entry)?)
                        .await
                    {
                        Ok(_) => return Ok(()),
                        Err(StoreError::AlreadyExists { .. }) => continue,
                        Err(e) => return Err(e.into()),
                    }
                }
            }
        }

        Err(DomainError::Conflict(format!("stock/{key}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::InMemoryDocumentStore;

    fn ledger() -> StockLedger<InMemoryDocumentStore> {
        StockLedger::new(InMemoryDocumentStore::new())
    }

    fn entry(quantity: u32) -> (ProductId, BranchId, StockEntry) {
        let product = ProductId::new("SKU-001");
        let branch = BranchId::new();
        let entry = StockEntry {
            product_id: product.clone(),
            branch_id: branch,
            quantity,
        };
        (product, branch, entry)
    }

    #[tokio::test]
    async fn set_then_available() {
        let ledger = ledger();
        let (product, branch, e) = entry(5);

        ledger.set(e).await.unwrap();
        assert_eq!(ledger.available(&product, &branch).await.unwrap(), Some(5));
    }

    #[tokio::test]
    async fn unknown_pair_has_no_availability() {
        let ledger = ledger();
        let product = ProductId::new("SKU-404");
        let branch = BranchId::new();
        assert_eq!(ledger.available(&product, &branch).await.unwrap(), None);
    }

    #[tokio::test]
    async fn take_decrements_quantity() {
        let ledger = ledger();
        let (product, branch, e) = entry(5);
        ledger.set(e).await.unwrap();

        ledger.try_take(&product, &branch, 3).await.unwrap();
        assert_eq!(ledger.available(&product, &branch).await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn take_beyond_available_is_rejected_with_available() {
        let ledger = ledger();
        let (product, branch, e) = entry(5);
        ledger.set(e).await.unwrap();

        let result = ledger.try_take(&product, &branch, 6).await;
        assert!(matches!(
            result,
            Err(DomainError::InsufficientStock { available: 5, .. })
        ));
        // Rejection left the ledger untouched
        assert_eq!(ledger.available(&product, &branch).await.unwrap(), Some(5));
    }

    #[tokio::test]
    async fn take_from_unknown_pair_is_not_found() {
        let ledger = ledger();
        let product = ProductId::new("SKU-404");
        let branch = BranchId::new();

        let result = ledger.try_take(&product, &branch, 1).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn give_back_restores_quantity() {
        let ledger = ledger();
        let (product, branch, e) = entry(5);
        ledger.set(e).await.unwrap();

        ledger.try_take(&product, &branch, 5).await.unwrap();
        ledger.give_back(&product, &branch, 5).await.unwrap();
        assert_eq!(ledger.available(&product, &branch).await.unwrap(), Some(5));
    }

    #[tokio::test]
    async fn concurrent_takes_never_oversell() {
        let ledger = ledger();
        let (product, branch, e) = entry(10);
        ledger.set(e).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..20 {
            let ledger = ledger.clone();
            let product = product.clone();
            handles.push(tokio::spawn(async move {
                ledger.try_take(&product, &branch, 1).await
            }));
        }

        let mut taken = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                taken += 1;
            }
        }

        let remaining = ledger.available(&product, &branch).await.unwrap().unwrap();
        assert_eq!(taken + remaining, 10);
    }
}
