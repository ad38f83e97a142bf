//! Payment confirmation endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use domain::Order;
use store::DocumentStore;

use crate::error::ApiError;
use crate::state::AppState;

/// POST /payment/confirm/:id — charge the gateway for the order amount and
/// record the confirmation (`pending -> paid`).
#[tracing::instrument(skip(state))]
pub async fn confirm<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order_id = super::orders::parse_order_id(&id)?;

    let order = state.orders.get_order(order_id).await?;
    let confirmation = state
        .payments
        .charge(order_id, order.payment.amount)
        .await?;

    let order = state.orders.record_payment(order_id, confirmation).await?;
    Ok(Json(order))
}
