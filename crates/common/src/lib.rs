//! Shared identifier and value types for the fulfillment core.

pub mod money;
pub mod types;

pub use money::Money;
pub use types::{BranchId, CustomerId, LogisticId, OrderId, ProductId, Version};
