//! Order query execution: filter, sort, paginate.

use domain::{ORDER_COLLECTION, Order};
use store::{DocumentStore, StoreError};
use thiserror::Error;

use crate::filter::{OrderFilter, SortOption};

/// Errors from query execution.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Malformed query input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Storage failure while reading orders.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A stored order payload failed to decode.
    #[error("Corrupt order document: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Result type for query operations.
pub type Result<T> = std::result::Result<T, QueryError>;

/// Pagination facts for a query result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMetadata {
    /// 1-based page number that was requested.
    pub page: u32,
    /// Total pages at the requested page size (0 when nothing matched).
    pub total_pages: u32,
    /// Total matching orders across all pages.
    pub total_count: u64,
}

/// One page of matching orders.
#[derive(Debug, Clone)]
pub struct QueryPage {
    pub orders: Vec<Order>,
    pub metadata: PageMetadata,
}

/// Read-side engine over the orders collection.
///
/// Deterministic: the same stored orders and the same query always produce
/// the same page, byte for byte. Every ordering ends with the order id as the
/// final tiebreaker.
#[derive(Clone)]
pub struct OrderQueryEngine<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> OrderQueryEngine<S> {
    /// Creates a query engine over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Runs a filtered, sorted, paginated query.
    ///
    /// `page` is 1-based. A page past the end returns an empty result with
    /// accurate metadata rather than an error.
    #[tracing::instrument(skip(self, filter))]
    pub async fn query(
        &self,
        filter: &OrderFilter,
        sort: SortOption,
        page: u32,
        page_size: u32,
    ) -> Result<QueryPage> {
        if page == 0 {
            return Err(QueryError::Validation("page numbers start at 1".to_string()));
        }
        if page_size == 0 {
            return Err(QueryError::Validation("page size must be positive".to_string()));
        }

        let docs = self.store.list(ORDER_COLLECTION).await?;
        let mut matching = Vec::new();
        for doc in &docs {
            let order: Order = doc.decode()?;
            if filter.matches(&order) {
                matching.push(order);
            }
        }

        sort_orders(&mut matching, sort, filter.search_text());

        let total_count = matching.len() as u64;
        let total_pages = total_count.div_ceil(u64::from(page_size)) as u32;

        let start = (page as usize - 1).saturating_mul(page_size as usize);
        let orders = matching
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .collect();

        Ok(QueryPage {
            orders,
            metadata: PageMetadata {
                page,
                total_pages,
                total_count,
            },
        })
    }
}

fn sort_orders(orders: &mut [Order], sort: SortOption, query: Option<&str>) {
    match (sort, query) {
        (SortOption::BestMatch, Some(query)) => {
            let query = query.to_lowercase();
            orders.sort_by(|a, b| {
                relevance(b, &query)
                    .cmp(&relevance(a, &query))
                    .then_with(|| newest_first(a, b))
            });
        }
        // A relevance sort without a query degrades to recency.
        _ => orders.sort_by(newest_first),
    }
}

fn newest_first(a: &Order, b: &Order) -> std::cmp::Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.id.to_string().cmp(&b.id.to_string()))
}

/// Relevance score for one order against a lowercased query.
///
/// A fixed ladder, strongest rung wins: exact id, exact phone, id substring,
/// name word prefix, name substring, phone substring.
fn relevance(order: &Order, query: &str) -> u32 {
    let id = order.id.to_string().to_lowercase();
    let name = order.customer.name.to_lowercase();
    let phone = order.customer.phone.to_lowercase();

    if id == query {
        100
    } else if phone == query {
        90
    } else if id.contains(query) {
        60
    } else if name.split_whitespace().any(|word| word.starts_with(query)) {
        55
    } else if name.contains(query) {
        50
    } else if phone.contains(query) {
        40
    } else {
        0
    }
}
