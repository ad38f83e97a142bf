//! Cart aggregate: a shopper's selected line items for one branch.

pub mod service;

use common::{BranchId, CustomerId, Money, ProductId};
use serde::{Deserialize, Serialize};

pub use service::{AdjustLine, CartService, ClampedLine, LinePricing, MergeOutcome};

/// Collection holding cart documents.
pub const CART_COLLECTION: &str = "carts";

/// Who a cart belongs to: an authenticated customer or an anonymous session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CartOwner {
    User(CustomerId),
    Anonymous(String),
}

impl CartOwner {
    /// Resolves an opaque owner token: a UUID is an authenticated customer,
    /// anything else an anonymous session token.
    pub fn parse(token: &str) -> Self {
        match token.parse::<CustomerId>() {
            Ok(customer_id) => CartOwner::User(customer_id),
            Err(_) => CartOwner::Anonymous(token.to_string()),
        }
    }

    /// Document key for this owner's cart.
    pub fn key(&self) -> String {
        match self {
            CartOwner::User(id) => id.to_string(),
            CartOwner::Anonymous(token) => token.clone(),
        }
    }
}

impl std::fmt::Display for CartOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// One selected product in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,

    /// Always > 0; a line that would drop to zero is removed instead.
    pub quantity: u32,

    pub unit_price: Money,

    /// Promotional price; when present it takes precedence over `unit_price`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_price: Option<Money>,
}

impl CartLine {
    /// The price one unit actually sells for.
    pub fn effective_price(&self) -> Money {
        self.discount_price.unwrap_or(self.unit_price)
    }

    /// Total for this line (quantity x effective price).
    pub fn line_total(&self) -> Money {
        self.effective_price().multiply(self.quantity)
    }
}

/// A shopper's cart. All lines reference the cart's single branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub owner: CartOwner,

    /// Adopted from the first line added; `None` only while the cart is empty.
    pub branch_id: Option<BranchId>,

    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Creates an empty cart for an owner.
    pub fn empty(owner: CartOwner) -> Self {
        Self {
            owner,
            branch_id: None,
            lines: Vec::new(),
        }
    }

    /// Returns the line for a product, if present.
    pub fn line(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.product_id == product_id)
    }

    /// Returns the quantity currently held for a product (0 if absent).
    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.line(product_id).map_or(0, |l| l.quantity)
    }

    /// Inserts or replaces the line for `line.product_id`.
    pub fn set_line(&mut self, line: CartLine) {
        match self.lines.iter_mut().find(|l| l.product_id == line.product_id) {
            Some(existing) => *existing = line,
            None => self.lines.push(line),
        }
    }

    /// Removes the line for a product, if present.
    pub fn remove_line(&mut self, product_id: &ProductId) {
        self.lines.retain(|l| &l.product_id != product_id);
    }

    /// Returns true if the cart holds no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Cart total: sum of quantity x (discount price, falling back to unit
    /// price) over all lines.
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }
}
