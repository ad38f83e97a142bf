//! Order status lifecycle.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// The status of an order in its lifecycle.
///
/// Status transitions:
/// ```text
/// pending ──► paid ──┬──► onRoute ────────┬──► delivered
///    │         │     └──► readyForPickup ─┘
///    │         │               │          │
///    └─────────┴───────────────┴──────────┴──► cancelled (pre-terminal only)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Created at checkout, awaiting payment confirmation.
    #[default]
    #[serde(rename = "pending")]
    Pending,

    /// Payment confirmed; eligible for logistics assignment.
    #[serde(rename = "paid")]
    Paid,

    /// Out for delivery.
    #[serde(rename = "onRoute")]
    OnRoute,

    /// Awaiting customer collection at the branch.
    #[serde(rename = "readyForPickup")]
    ReadyForPickup,

    /// Fulfilled (terminal).
    #[serde(rename = "delivered")]
    Delivered,

    /// Cancelled (terminal).
    #[serde(rename = "cancelled")]
    Cancelled,
}

impl OrderStatus {
    /// The closed set of legal transition targets from this status.
    pub fn allowed_targets(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[OrderStatus::Paid, OrderStatus::Cancelled],
            OrderStatus::Paid => &[
                OrderStatus::OnRoute,
                OrderStatus::ReadyForPickup,
                OrderStatus::Cancelled,
            ],
            OrderStatus::OnRoute => &[OrderStatus::Delivered, OrderStatus::Cancelled],
            OrderStatus::ReadyForPickup => &[OrderStatus::Delivered, OrderStatus::Cancelled],
            OrderStatus::Delivered => &[],
            OrderStatus::Cancelled => &[],
        }
    }

    /// Returns true if `to` is a legal transition target from this status.
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        self.allowed_targets().contains(&to)
    }

    /// Returns true if this is a terminal status (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Returns true if a logistics resource may be bound in this status.
    pub fn accepts_logistics(&self) -> bool {
        matches!(
            self,
            OrderStatus::Paid | OrderStatus::OnRoute | OrderStatus::ReadyForPickup
        )
    }

    /// All statuses, for exhaustive iteration.
    pub fn all() -> &'static [OrderStatus] {
        &[
            OrderStatus::Pending,
            OrderStatus::Paid,
            OrderStatus::OnRoute,
            OrderStatus::ReadyForPickup,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ]
    }

    /// Returns the wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::OnRoute => "onRoute",
            OrderStatus::ReadyForPickup => "readyForPickup",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::all()
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::Validation(format!("unknown order status: {s:?}")))
    }
}
