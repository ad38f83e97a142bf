use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::Version;
use tokio::sync::RwLock;

use crate::{Document, Result, StoreError, store::DocumentStore};

type Key = (String, String);

/// In-memory document store.
///
/// Backs the default server configuration and all unit tests. Provides the
/// same conditional-write semantics as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    documents: Arc<RwLock<HashMap<Key, Document>>>,
}

impl InMemoryDocumentStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of documents stored.
    pub async fn document_count(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Clears all documents.
    pub async fn clear(&self) {
        self.documents.write().await.clear();
    }

    fn key(collection: &str, id: &str) -> Key {
        (collection.to_string(), id.to_string())
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn put_new(
        &self,
        collection: &str,
        id: &str,
        payload: serde_json::Value,
    ) -> Result<Version> {
        let mut documents = self.documents.write().await;
        let key = Self::key(collection, id);

        if documents.contains_key(&key) {
            return Err(StoreError::AlreadyExists {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }

        let version = Version::first();
        documents.insert(
            key,
            Document {
                collection: collection.to_string(),
                id: id.to_string(),
                version,
                payload,
                updated_at: Utc::now(),
            },
        );

        Ok(version)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let documents = self.documents.read().await;
        Ok(documents.get(&Self::key(collection, id)).cloned())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        expected: Version,
        payload: serde_json::Value,
    ) -> Result<Version> {
        let mut documents = self.documents.write().await;

        let doc = documents
            .get_mut(&Self::key(collection, id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        if doc.version != expected {
            return Err(StoreError::ConcurrencyConflict {
                collection: collection.to_string(),
                id: id.to_string(),
                expected,
                actual: doc.version,
            });
        }

        doc.version = doc.version.next();
        doc.payload = payload;
        doc.updated_at = Utc::now();

        Ok(doc.version)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let mut documents = self.documents.write().await;
        Ok(documents.remove(&Self::key(collection, id)).is_some())
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>> {
        let documents = self.documents.read().await;
        Ok(documents
            .values()
            .filter(|d| d.collection == collection)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DocumentStoreExt;
    use serde_json::json;

    #[tokio::test]
    async fn put_new_stores_at_version_one() {
        let store = InMemoryDocumentStore::new();
        let version = store.put_new("orders", "o-1", json!({"x": 1})).await.unwrap();
        assert_eq!(version, Version::first());

        let doc = store.get_required("orders", "o-1").await.unwrap();
        assert_eq!(doc.version, Version::first());
        assert_eq!(doc.payload, json!({"x": 1}));
    }

    #[tokio::test]
    async fn put_new_rejects_duplicate_key() {
        let store = InMemoryDocumentStore::new();
        store.put_new("orders", "o-1", json!({})).await.unwrap();

        let result = store.put_new("orders", "o-1", json!({})).await;
        assert!(matches!(result, Err(StoreError::AlreadyExists { .. })));
    }

    #[tokio::test]
    async fn same_id_is_distinct_across_collections() {
        let store = InMemoryDocumentStore::new();
        store.put_new("orders", "shared", json!({"k": "o"})).await.unwrap();
        store.put_new("carts", "shared", json!({"k": "c"})).await.unwrap();

        let order = store.get_required("orders", "shared").await.unwrap();
        let cart = store.get_required("carts", "shared").await.unwrap();
        assert_eq!(order.payload, json!({"k": "o"}));
        assert_eq!(cart.payload, json!({"k": "c"}));
    }

    #[tokio::test]
    async fn update_with_matching_version_succeeds() {
        let store = InMemoryDocumentStore::new();
        let v1 = store.put_new("orders", "o-1", json!({"n": 1})).await.unwrap();

        let v2 = store.update("orders", "o-1", v1, json!({"n": 2})).await.unwrap();
        assert_eq!(v2, v1.next());

        let doc = store.get_required("orders", "o-1").await.unwrap();
        assert_eq!(doc.payload, json!({"n": 2}));
    }

    #[tokio::test]
    async fn update_with_stale_version_conflicts() {
        let store = InMemoryDocumentStore::new();
        let v1 = store.put_new("orders", "o-1", json!({"n": 1})).await.unwrap();
        store.update("orders", "o-1", v1, json!({"n": 2})).await.unwrap();

        // Second writer still holds v1
        let result = store.update("orders", "o-1", v1, json!({"n": 3})).await;
        assert!(matches!(
            result,
            Err(StoreError::ConcurrencyConflict { expected, actual, .. })
                if expected == v1 && actual == v1.next()
        ));

        // The losing write must not have applied
        let doc = store.get_required("orders", "o-1").await.unwrap();
        assert_eq!(doc.payload, json!({"n": 2}));
    }

    #[tokio::test]
    async fn update_missing_document_is_not_found() {
        let store = InMemoryDocumentStore::new();
        let result = store
            .update("orders", "ghost", Version::first(), json!({}))
            .await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn delete_removes_document() {
        let store = InMemoryDocumentStore::new();
        store.put_new("carts", "c-1", json!({})).await.unwrap();

        assert!(store.delete("carts", "c-1").await.unwrap());
        assert!(!store.delete("carts", "c-1").await.unwrap());
        assert!(!store.exists("carts", "c-1").await.unwrap());
    }

    #[tokio::test]
    async fn list_returns_only_requested_collection() {
        let store = InMemoryDocumentStore::new();
        store.put_new("orders", "o-1", json!({})).await.unwrap();
        store.put_new("orders", "o-2", json!({})).await.unwrap();
        store.put_new("carts", "c-1", json!({})).await.unwrap();

        let orders = store.list("orders").await.unwrap();
        assert_eq!(orders.len(), 2);
        assert!(orders.iter().all(|d| d.collection == "orders"));
    }

    #[tokio::test]
    async fn concurrent_conditional_updates_admit_one_winner() {
        let store = InMemoryDocumentStore::new();
        let v1 = store.put_new("stock", "p:b", json!({"qty": 5})).await.unwrap();

        let mut handles = Vec::new();
        for n in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.update("stock", "p:b", v1, json!({"qty": n})).await
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
