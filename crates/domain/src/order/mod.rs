//! Placed orders: the immutable checkout snapshot plus its status lifecycle.

pub mod service;
pub mod status;

use chrono::{DateTime, Utc};
use common::{BranchId, CustomerId, LogisticId, Money, OrderId, ProductId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

pub use service::{OrderService, PaymentConfirmation};
pub use status::OrderStatus;

/// Collection holding order documents.
pub const ORDER_COLLECTION: &str = "orders";

/// Customer details frozen onto an order at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    /// Absent for guest checkouts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<CustomerId>,
    pub name: String,
    pub phone: String,
}

/// How an order reaches the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryMethod {
    #[serde(rename = "express")]
    Express,
    #[serde(rename = "pick-up")]
    PickUp,
    #[serde(rename = "normal")]
    Normal,
}

impl DeliveryMethod {
    /// Returns the wire name of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryMethod::Express => "express",
            DeliveryMethod::PickUp => "pick-up",
            DeliveryMethod::Normal => "normal",
        }
    }
}

impl std::fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DeliveryMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "express" => Ok(DeliveryMethod::Express),
            "pick-up" => Ok(DeliveryMethod::PickUp),
            "normal" => Ok(DeliveryMethod::Normal),
            other => Err(DomainError::Validation(format!(
                "unknown delivery method: {other:?}"
            ))),
        }
    }
}

/// Delivery choices recorded at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    pub method: DeliveryMethod,
    /// Customer-chosen delivery time window, e.g. `"2026-08-24 10:00-12:00"`.
    pub slot: String,
    pub address: String,
}

/// Payment progress on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "confirmed")]
    Confirmed,
    #[serde(rename = "refunded")]
    Refunded,
}

/// Payment record frozen at checkout and completed by the gateway signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// Opaque gateway transaction reference; set when payment confirms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    pub amount: Money,
    pub status: PaymentStatus,
}

/// One product line frozen onto an order.
///
/// `unit_price` is the effective price the line sold at (discount applied);
/// later catalog or stock changes never alter it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
}

/// An order: created once at checkout, then mutated only through status and
/// logistics transitions until it reaches a terminal status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub customer: CustomerInfo,
    pub branch_id: BranchId,
    /// Frozen copy of the cart at checkout; never re-reads live stock.
    pub products: Vec<OrderLine>,
    pub delivery: Delivery,
    pub payment: Payment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logistics_ref: Option<LogisticId>,
}

impl Order {
    /// Order total: sum of frozen line totals.
    pub fn total(&self) -> Money {
        self.products
            .iter()
            .map(|l| l.unit_price.multiply(l.quantity))
            .sum()
    }

    /// Returns true if the order is in a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn sample_order() -> Order {
        Order {
            id: OrderId::new(),
            status: OrderStatus::Pending,
            created_at: Utc::now(),
            customer: CustomerInfo {
                customer_id: Some(CustomerId::new()),
                name: "Ada Lovelace".to_string(),
                phone: "+44 20 7946 0001".to_string(),
            },
            branch_id: BranchId::new(),
            products: vec![
                OrderLine {
                    product_id: ProductId::new("SKU-001"),
                    quantity: 2,
                    unit_price: Money::from_cents(1000),
                },
                OrderLine {
                    product_id: ProductId::new("SKU-002"),
                    quantity: 1,
                    unit_price: Money::from_cents(450),
                },
            ],
            delivery: Delivery {
                method: DeliveryMethod::Express,
                slot: "2026-08-24 10:00-12:00".to_string(),
                address: "1 Example Street".to_string(),
            },
            payment: Payment {
                transaction_id: None,
                amount: Money::from_cents(2450),
                status: PaymentStatus::Pending,
            },
            logistics_ref: None,
        }
    }

    #[test]
    fn total_sums_frozen_lines() {
        assert_eq!(sample_order().total().cents(), 2450);
    }

    #[test]
    fn delivery_method_wire_names() {
        assert_eq!(
            serde_json::to_string(&DeliveryMethod::PickUp).unwrap(),
            "\"pick-up\""
        );
        assert_eq!("express".parse::<DeliveryMethod>().unwrap(), DeliveryMethod::Express);
        assert!("teleport".parse::<DeliveryMethod>().is_err());
    }

    #[test]
    fn serialization_roundtrip() {
        let order = sample_order();
        let json = serde_json::to_string(&order).unwrap();
        let back: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(order, back);
    }
}
