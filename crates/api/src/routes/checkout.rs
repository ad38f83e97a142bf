//! Checkout endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::CustomerId;
use domain::{CartOwner, CheckoutDetails, CustomerInfo, DeliveryMethod, Order};
use serde::Deserialize;
use store::DocumentStore;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Wire name: `express`, `pick-up`, or `normal`.
    pub method: String,
    pub slot: String,
    pub address: String,
    pub customer: CheckoutCustomer,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutCustomer {
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    pub name: String,
    pub phone: String,
}

/// POST /checkout/:owner — freeze the owner's cart into a pending order.
#[tracing::instrument(skip(state, req))]
pub async fn place_order<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(owner): Path<String>,
    Json(req): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let owner = CartOwner::parse(&owner);
    let method: DeliveryMethod = req.method.parse()?;

    let order = state
        .checkout
        .checkout(
            &owner,
            CheckoutDetails {
                customer: CustomerInfo {
                    customer_id: req.customer.customer_id,
                    name: req.customer.name,
                    phone: req.customer.phone,
                },
                method,
                slot: req.slot,
                address: req.address,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(order)))
}
