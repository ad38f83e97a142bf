//! HTTP route handlers.

pub mod cart;
pub mod checkout;
pub mod health;
pub mod logistics;
pub mod metrics;
pub mod orders;
pub mod payment;
pub mod stock;
