//! Logistics administration endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::LogisticId;
use domain::{Logistic, NewLogistic, VehicleType};
use serde::Deserialize;
use store::DocumentStore;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLogisticRequest {
    pub driver_name: String,
    pub vehicle_type: VehicleType,
    pub vehicle_registration: String,
    /// Raw photo bytes as sent by the client; uploaded to the blob store.
    #[serde(default)]
    pub driver_photo: Option<String>,
}

/// POST /admin/logistics — register a delivery resource.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateLogisticRequest>,
) -> Result<(StatusCode, Json<Logistic>), ApiError> {
    let driver_photo = match req.driver_photo {
        Some(photo) if !photo.is_empty() => {
            Some(state.blobs.put(photo.as_bytes(), None).await?)
        }
        _ => None,
    };

    let logistic = state
        .logistics
        .create(NewLogistic {
            driver_name: req.driver_name,
            vehicle_type: req.vehicle_type,
            vehicle_registration: req.vehicle_registration,
            driver_photo,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(logistic)))
}

/// GET /admin/logistics — list delivery resources, active first.
#[tracing::instrument(skip(state))]
pub async fn list<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Logistic>>, ApiError> {
    let logistics = state.logistics.list().await?;
    Ok(Json(logistics))
}

/// PUT /admin/logistics/:id/retire — take a resource out of rotation.
#[tracing::instrument(skip(state))]
pub async fn retire<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Logistic>, ApiError> {
    let id = id
        .parse::<LogisticId>()
        .map_err(|e| ApiError::BadRequest(format!("Invalid logistic id: {e}")))?;
    let logistic = state.logistics.retire(id).await?;
    Ok(Json(logistic))
}
