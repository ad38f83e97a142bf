//! Versioned document store for the fulfillment core.
//!
//! State is persisted as JSON documents keyed by `(collection, id)`. Every
//! write is conditional on the version the writer last read, which is the
//! optimistic-concurrency guard all mutating operations in the domain layer
//! rely on.

pub mod document;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use common::Version;
pub use document::Document;
pub use error::{Result, StoreError};
pub use memory::InMemoryDocumentStore;
pub use postgres::PostgresDocumentStore;
pub use store::{DocumentStore, DocumentStoreExt};
