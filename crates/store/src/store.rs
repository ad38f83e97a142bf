use async_trait::async_trait;
use common::Version;

use crate::{Document, Result, StoreError};

/// Core trait for versioned document storage.
///
/// Every write is conditional: `put_new` fails if the key exists, and
/// `update` fails with [`StoreError::ConcurrencyConflict`] unless the caller
/// presents the version it last read. All implementations must be
/// thread-safe (Send + Sync).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a new document at version 1.
    ///
    /// Fails with [`StoreError::AlreadyExists`] if a document with the same
    /// key is already stored.
    async fn put_new(
        &self,
        collection: &str,
        id: &str,
        payload: serde_json::Value,
    ) -> Result<Version>;

    /// Retrieves a document, or `None` if it does not exist.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Replaces a document's payload if and only if its stored version
    /// equals `expected`. Returns the new version.
    ///
    /// Fails with [`StoreError::ConcurrencyConflict`] on a version mismatch
    /// and [`StoreError::NotFound`] if the document does not exist.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        expected: Version,
        payload: serde_json::Value,
    ) -> Result<Version>;

    /// Deletes a document. Returns true if a document was removed.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool>;

    /// Returns a point-in-time snapshot of every document in a collection.
    ///
    /// Ordering is unspecified; callers sort as needed.
    async fn list(&self, collection: &str) -> Result<Vec<Document>>;
}

/// Extension trait providing convenience methods for document stores.
#[async_trait]
pub trait DocumentStoreExt: DocumentStore {
    /// Retrieves a document, failing with [`StoreError::NotFound`] if absent.
    async fn get_required(&self, collection: &str, id: &str) -> Result<Document> {
        self.get(collection, id)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })
    }

    /// Checks whether a document exists.
    async fn exists(&self, collection: &str, id: &str) -> Result<bool> {
        Ok(self.get(collection, id).await?.is_some())
    }
}

// Blanket implementation for all DocumentStore implementations
impl<T: DocumentStore + ?Sized> DocumentStoreExt for T {}
