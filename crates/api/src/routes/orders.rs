//! Order lifecycle and admin query endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use common::{LogisticId, OrderId};
use domain::{DeliveryMethod, Order, OrderStatus};
use queries::{DeliverySlotFilter, OrderFilter, SortOption};
use serde::{Deserialize, Serialize};
use store::DocumentStore;

use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: u32 = 10;

// -- Request types --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub new_status: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLogisticsRequest {
    pub new_logistic_id: LogisticId,
}

/// Raw admin query parameters. Everything arrives as an optional string;
/// blank values are treated as absent so a UI can always send every key.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminOrdersParams {
    pub search_query: Option<String>,
    pub status: Option<String>,
    pub method: Option<String>,
    pub delivery_slot: Option<String>,
    pub slot_from: Option<String>,
    pub slot_to: Option<String>,
    pub logistic: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub sort_option: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOrdersResponse {
    pub orders: Vec<Order>,
    pub page: u32,
    pub total_pages: u32,
    pub total_count: u64,
}

// -- Handlers --

/// GET /orders/:id — fetch one order.
#[tracing::instrument(skip(state))]
pub async fn get<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.orders.get_order(order_id).await?;
    Ok(Json(order))
}

/// PUT /orders/update-status/:id — move an order along the status table.
#[tracing::instrument(skip(state, req))]
pub async fn update_status<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, ApiError> {
    let order_id = parse_order_id(&id)?;
    // An unknown status name is a 400; a known status that is not a legal
    // target of the current one is a 409 from the transition itself.
    let requested: OrderStatus = req.new_status.parse()?;

    let order = state.orders.transition(order_id, requested).await?;
    Ok(Json(order))
}

/// PUT /orders/update-logistics/:id — bind a delivery resource to an order.
#[tracing::instrument(skip(state, req))]
pub async fn update_logistics<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateLogisticsRequest>,
) -> Result<Json<Order>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state
        .orders
        .assign_logistics(order_id, req.new_logistic_id)
        .await?;
    Ok(Json(order))
}

/// GET /admin/orders — filtered, sorted, paginated order listing.
#[tracing::instrument(skip(state, params))]
pub async fn admin_list<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<AdminOrdersParams>,
) -> Result<Json<AdminOrdersResponse>, ApiError> {
    let (filter, sort, page, page_size) = parse_admin_params(params)?;

    let result = state.queries.query(&filter, sort, page, page_size).await?;

    Ok(Json(AdminOrdersResponse {
        orders: result.orders,
        page: result.metadata.page,
        total_pages: result.metadata.total_pages,
        total_count: result.metadata.total_count,
    }))
}

fn parse_admin_params(
    params: AdminOrdersParams,
) -> Result<(OrderFilter, SortOption, u32, u32), ApiError> {
    let status = opt(params.status)
        .map(|s| {
            s.parse::<OrderStatus>()
                .map_err(|e| ApiError::BadRequest(e.to_string()))
        })
        .transpose()?;
    let method = opt(params.method)
        .map(|s| {
            s.parse::<DeliveryMethod>()
                .map_err(|e| ApiError::BadRequest(e.to_string()))
        })
        .transpose()?;
    let logistic = opt(params.logistic)
        .map(|s| {
            s.parse::<LogisticId>()
                .map_err(|e| ApiError::BadRequest(format!("Invalid logistic id: {e}")))
        })
        .transpose()?;

    let delivery_slot = match (
        opt(params.delivery_slot),
        opt(params.slot_from),
        opt(params.slot_to),
    ) {
        (Some(exact), _, _) => Some(DeliverySlotFilter::Exact(exact)),
        (None, Some(from), Some(to)) => Some(DeliverySlotFilter::Range { from, to }),
        (None, None, None) => None,
        _ => {
            return Err(ApiError::BadRequest(
                "slotFrom and slotTo must be given together".to_string(),
            ));
        }
    };

    let start_date = opt(params.start_date)
        .map(|s| parse_date(&s, DayBound::Start))
        .transpose()?;
    let end_date = opt(params.end_date)
        .map(|s| parse_date(&s, DayBound::End))
        .transpose()?;

    let sort = opt(params.sort_option)
        .map(|s| {
            s.parse::<SortOption>()
                .map_err(ApiError::BadRequest)
        })
        .transpose()?
        .unwrap_or_default();

    let page = parse_number(opt(params.page), "page")?.unwrap_or(1);
    let page_size = parse_number(opt(params.page_size), "pageSize")?.unwrap_or(DEFAULT_PAGE_SIZE);

    let filter = OrderFilter {
        search_query: opt(params.search_query),
        status,
        method,
        delivery_slot,
        logistic,
        start_date,
        end_date,
    };
    Ok((filter, sort, page, page_size))
}

fn opt(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn parse_number(value: Option<String>, name: &str) -> Result<Option<u32>, ApiError> {
    value
        .map(|s| {
            s.parse::<u32>()
                .map_err(|_| ApiError::BadRequest(format!("Invalid {name}: {s:?}")))
        })
        .transpose()
}

enum DayBound {
    Start,
    End,
}

/// Accepts an RFC 3339 timestamp or a bare `YYYY-MM-DD` date. A bare date
/// expands to the start or end of that day, so an `endDate` is inclusive.
fn parse_date(s: &str, bound: DayBound) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(s) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("Invalid date: {s:?}")))?;
    let time = match bound {
        DayBound::Start => NaiveTime::MIN,
        DayBound::End => NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap(),
    };
    Ok(date.and_time(time).and_utc())
}

pub(crate) fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    id.parse::<OrderId>()
        .map_err(|e| ApiError::BadRequest(format!("Invalid order id: {e}")))
}
