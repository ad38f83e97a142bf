//! Typed order filters.

use chrono::{DateTime, Utc};
use common::LogisticId;
use domain::{DeliveryMethod, Order, OrderStatus};

/// Delivery-slot matching: an exact slot string or a lexicographic range.
///
/// Slot strings are formatted `YYYY-MM-DD HH:MM-HH:MM`, so string ordering
/// matches chronological ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliverySlotFilter {
    Exact(String),
    Range { from: String, to: String },
}

impl DeliverySlotFilter {
    fn matches(&self, slot: &str) -> bool {
        match self {
            DeliverySlotFilter::Exact(wanted) => slot == wanted,
            DeliverySlotFilter::Range { from, to } => from.as_str() <= slot && slot <= to.as_str(),
        }
    }
}

/// Conjunctive order filter; every populated criterion must hold.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    /// Free-text search over order id, customer name, and phone.
    pub search_query: Option<String>,
    pub status: Option<OrderStatus>,
    pub method: Option<DeliveryMethod>,
    pub delivery_slot: Option<DeliverySlotFilter>,
    pub logistic: Option<LogisticId>,
    /// Inclusive lower bound on `created_at`.
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    pub end_date: Option<DateTime<Utc>>,
}

impl OrderFilter {
    /// Returns true if the order satisfies every populated criterion.
    pub fn matches(&self, order: &Order) -> bool {
        if let Some(status) = self.status
            && order.status != status
        {
            return false;
        }
        if let Some(method) = self.method
            && order.delivery.method != method
        {
            return false;
        }
        if let Some(slot) = &self.delivery_slot
            && !slot.matches(&order.delivery.slot)
        {
            return false;
        }
        if let Some(logistic) = self.logistic
            && order.logistics_ref != Some(logistic)
        {
            return false;
        }
        if let Some(start) = self.start_date
            && order.created_at < start
        {
            return false;
        }
        if let Some(end) = self.end_date
            && order.created_at > end
        {
            return false;
        }
        if let Some(query) = self.search_text()
            && !Self::text_matches(order, query)
        {
            return false;
        }
        true
    }

    /// The trimmed search query, or `None` when absent or blank.
    pub(crate) fn search_text(&self) -> Option<&str> {
        self.search_query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }

    fn text_matches(order: &Order, query: &str) -> bool {
        let query = query.to_lowercase();
        order.id.to_string().to_lowercase().contains(&query)
            || order.customer.name.to_lowercase().contains(&query)
            || order.customer.phone.to_lowercase().contains(&query)
    }
}

/// Result ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOption {
    /// Newest first. Also the fallback for a relevance sort with no query.
    #[default]
    CreatedAt,
    /// Relevance against the search query, strongest match first.
    BestMatch,
}

impl std::str::FromStr for SortOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createdAt" => Ok(SortOption::CreatedAt),
            "bestMatch" => Ok(SortOption::BestMatch),
            other => Err(format!("unknown sort option: {other:?}")),
        }
    }
}
