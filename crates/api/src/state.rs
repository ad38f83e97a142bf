//! Shared application state.

use std::sync::Arc;

use domain::{CartService, CheckoutService, LogisticsRepository, OrderService, StockLedger};
use queries::OrderQueryEngine;
use store::DocumentStore;

use crate::collab::{BlobStore, InMemoryBlobStore, InMemoryPaymentGateway, PaymentGateway};

/// Services shared by all handlers, all over the same document store.
pub struct AppState<S: DocumentStore + Clone> {
    pub carts: CartService<S>,
    pub checkout: CheckoutService<S>,
    pub orders: OrderService<S>,
    pub logistics: LogisticsRepository<S>,
    pub ledger: StockLedger<S>,
    pub queries: OrderQueryEngine<S>,
    pub payments: Arc<dyn PaymentGateway>,
    pub blobs: Arc<dyn BlobStore>,
}

impl<S: DocumentStore + Clone> AppState<S> {
    /// Wires every service over the given store and collaborators.
    pub fn new(store: S, payments: Arc<dyn PaymentGateway>, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            carts: CartService::new(store.clone()),
            checkout: CheckoutService::new(store.clone()),
            orders: OrderService::new(store.clone()),
            logistics: LogisticsRepository::new(store.clone()),
            ledger: StockLedger::new(store.clone()),
            queries: OrderQueryEngine::new(store),
            payments,
            blobs,
        }
    }
}

/// Creates application state backed by in-memory collaborators.
pub fn create_default_state<S: DocumentStore + Clone>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState::new(
        store,
        Arc::new(InMemoryPaymentGateway::new()),
        Arc::new(InMemoryBlobStore::new()),
    ))
}
