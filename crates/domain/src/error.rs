//! Domain error taxonomy.
//!
//! Every rejection is all-or-nothing: an operation that returns an error has
//! not mutated any cart, order, or stock state.

use common::{BranchId, ProductId};
use store::StoreError;
use thiserror::Error;

use crate::order::OrderStatus;

/// Errors that can occur during fulfillment-core operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Malformed or semantically invalid input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The cart is bound to a different branch.
    #[error("Cart belongs to branch {cart_branch}, got {requested}")]
    BranchMismatch {
        cart_branch: BranchId,
        requested: BranchId,
    },

    /// The requested line quantity exceeds the branch's available stock.
    #[error("Insufficient stock for {product_id}: {available} available")]
    InsufficientStock {
        product_id: ProductId,
        available: u32,
    },

    /// The requested status edge is not in the transition table.
    #[error("Illegal status transition: {from} -> {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },

    /// A state-dependent precondition was not met.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// An optimistic-concurrency race was lost; the caller may retry.
    #[error("Concurrent modification of {0}; retry")]
    Conflict(String),

    /// An unclassified storage failure.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::ConcurrencyConflict { collection, id, .. } => {
                DomainError::Conflict(format!("{collection}/{id}"))
            }
            other => DomainError::Store(other),
        }
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::Store(StoreError::Serialization(e))
    }
}

/// Result type for fulfillment-core operations.
pub type Result<T> = std::result::Result<T, DomainError>;
