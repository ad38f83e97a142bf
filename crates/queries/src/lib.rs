//! Read side of the fulfillment core: typed filters over stored orders with
//! deterministic sorting and pagination.

pub mod engine;
pub mod filter;

pub use engine::{OrderQueryEngine, PageMetadata, QueryError, QueryPage, Result};
pub use filter::{DeliverySlotFilter, OrderFilter, SortOption};
