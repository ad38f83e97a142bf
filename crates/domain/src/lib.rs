//! Fulfillment core: stock-bounded carts, checkout, the order status
//! lifecycle, and logistics assignment.
//!
//! Every service is generic over a [`store::DocumentStore`], so the same
//! logic runs against the in-memory store in tests and Postgres in
//! production. All writes are conditional on the version the state was read
//! at; rejections are all-or-nothing.

mod codec;

pub mod cart;
pub mod checkout;
pub mod error;
pub mod logistics;
pub mod order;
pub mod stock;

pub use cart::{
    AdjustLine, CART_COLLECTION, Cart, CartLine, CartOwner, CartService, ClampedLine, LinePricing,
    MergeOutcome,
};
pub use checkout::{CheckoutDetails, CheckoutService, freeze};
pub use error::{DomainError, Result};
pub use logistics::{LOGISTICS_COLLECTION, Logistic, LogisticsRepository, NewLogistic, VehicleType};
pub use order::{
    CustomerInfo, Delivery, DeliveryMethod, ORDER_COLLECTION, Order, OrderLine, OrderService,
    OrderStatus, Payment, PaymentConfirmation, PaymentStatus,
};
pub use stock::{STOCK_COLLECTION, StockEntry, StockLedger, stock_key};
