//! Stock administration endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use common::{BranchId, ProductId};
use domain::StockEntry;
use serde::Deserialize;
use store::DocumentStore;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetStockRequest {
    pub product_id: String,
    pub branch_id: BranchId,
    pub quantity: u32,
}

/// POST /admin/stock — set the absolute quantity for a (product, branch).
#[tracing::instrument(skip(state, req))]
pub async fn set<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<SetStockRequest>,
) -> Result<Json<StockEntry>, ApiError> {
    let entry = StockEntry {
        product_id: ProductId::new(&req.product_id),
        branch_id: req.branch_id,
        quantity: req.quantity,
    };
    state.ledger.set(entry.clone()).await?;
    Ok(Json(entry))
}
