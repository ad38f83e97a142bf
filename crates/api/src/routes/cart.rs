//! Cart endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::{BranchId, Money, ProductId};
use domain::{AdjustLine, Cart, CartOwner, ClampedLine, LinePricing};
use serde::{Deserialize, Serialize};
use store::DocumentStore;

use crate::error::ApiError;
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustLineRequest {
    pub product_id: String,
    pub branch_id: BranchId,
    /// Signed quantity delta.
    pub quantity: i64,
    /// Cents; required only when the product is not in the cart yet.
    #[serde(default)]
    pub unit_price: Option<Money>,
    #[serde(default)]
    pub discount_price: Option<Money>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
    /// Owner token of the anonymous cart being merged in.
    pub from_owner: String,
}

// -- Response types --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub owner: String,
    pub branch_id: Option<BranchId>,
    pub lines: Vec<CartLineResponse>,
    /// Cents.
    pub total: Money,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineResponse {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_price: Option<Money>,
    pub line_total: Money,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeResponse {
    #[serde(flatten)]
    pub cart: CartResponse,
    /// Lines whose quantity was capped at available stock during the merge.
    pub clamped: Vec<ClampedLineResponse>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClampedLineResponse {
    pub product_id: String,
    pub requested: u32,
    pub kept: u32,
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        CartResponse {
            owner: cart.owner.key(),
            branch_id: cart.branch_id,
            lines: cart
                .lines
                .iter()
                .map(|line| CartLineResponse {
                    product_id: line.product_id.to_string(),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    discount_price: line.discount_price,
                    line_total: line.line_total(),
                })
                .collect(),
            total: cart.total(),
        }
    }
}

impl From<ClampedLine> for ClampedLineResponse {
    fn from(line: ClampedLine) -> Self {
        ClampedLineResponse {
            product_id: line.product_id.to_string(),
            requested: line.requested,
            kept: line.kept,
        }
    }
}

// -- Handlers --

/// GET /cart/:owner — fetch the owner's cart (empty if none yet).
#[tracing::instrument(skip(state))]
pub async fn get<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(owner): Path<String>,
) -> Result<Json<CartResponse>, ApiError> {
    let owner = CartOwner::parse(&owner);
    let cart = state.carts.get(&owner).await?;
    Ok(Json(CartResponse::from(&cart)))
}

/// POST /cart/:owner — adjust one line by a signed quantity delta.
#[tracing::instrument(skip(state, req))]
pub async fn adjust<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(owner): Path<String>,
    Json(req): Json<AdjustLineRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let owner = CartOwner::parse(&owner);
    let pricing = req.unit_price.map(|unit_price| LinePricing {
        unit_price,
        discount_price: req.discount_price,
    });

    let cart = state
        .carts
        .adjust_line(
            &owner,
            AdjustLine {
                product_id: ProductId::new(&req.product_id),
                branch_id: req.branch_id,
                delta: req.quantity,
                pricing,
            },
        )
        .await?;

    Ok(Json(CartResponse::from(&cart)))
}

/// POST /cart/:owner/merge — merge an anonymous cart into this one.
#[tracing::instrument(skip(state, req))]
pub async fn merge<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(owner): Path<String>,
    Json(req): Json<MergeRequest>,
) -> Result<Json<MergeResponse>, ApiError> {
    let local = CartOwner::parse(&req.from_owner);
    let persisted = CartOwner::parse(&owner);

    let outcome = state.carts.merge_carts(&local, &persisted).await?;

    Ok(Json(MergeResponse {
        cart: CartResponse::from(&outcome.cart),
        clamped: outcome.clamped.into_iter().map(Into::into).collect(),
    }))
}
