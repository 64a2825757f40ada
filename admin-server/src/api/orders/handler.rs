//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use http::HeaderMap;
use serde::Deserialize;
use validator::Validate;

use shared::models::Order;
use shared::order::{
    ApplyRefundRequest, ApplyRefundResponse, BulkStatusResponse, BulkUpdateStatusRequest,
    CancelRefundResponse, CreateOrderRequest, ItemUpdateRequest, StatusUpdateResponse,
    StockCheckResponse, UpdateFlagsRequest, UpdateStatusRequest,
};
use shared::{AppError, AppResult};

use crate::core::ServerState;
use crate::orders::OrderError;

/// Operator identity supplied by the session layer (external collaborator)
const OPERATOR_HEADER: &str = "x-operator-id";

fn operator_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(OPERATOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Query params for listing orders
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// List orders (paginated)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Order>>> {
    let orders = state.orders.list_orders(query.limit, query.offset).await?;
    Ok(Json(orders))
}

/// Get order by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let order = state.orders.get_order(&id).await?;
    Ok(Json(order))
}

/// Create a new order
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<Json<Order>> {
    let order = state.orders.create_order(payload).await?;
    Ok(Json(order))
}

/// Run a status transition
///
/// Stock conflicts are part of the response contract, not an error: the
/// admin console renders the conflict list for per-item remediation.
pub async fn update_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<StatusUpdateResponse>> {
    match state.orders.update_status(&id, payload.new_status).await {
        Ok(order) => Ok(Json(StatusUpdateResponse {
            success: true,
            message: format!("Order status updated to {}", order.order_status),
            order: Some(order),
            stock_conflicts: None,
        })),
        Err(OrderError::StockConflict(conflicts)) => Ok(Json(StatusUpdateResponse {
            success: false,
            message: "Insufficient stock for requested transition".into(),
            order: None,
            stock_conflicts: Some(conflicts),
        })),
        Err(err) => Err(err.into()),
    }
}

/// Run a status transition over a batch of orders
pub async fn bulk_update_status(
    State(state): State<ServerState>,
    Json(payload): Json<BulkUpdateStatusRequest>,
) -> AppResult<Json<BulkStatusResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let response = state
        .orders
        .bulk_update_status(&payload.order_ids, payload.new_status)
        .await;
    Ok(Json(response))
}

/// Pre-flight stock availability check
pub async fn check_stock(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<StockCheckResponse>> {
    let response = state.orders.check_order_stock(&id).await?;
    Ok(Json(response))
}

/// Apply a refund
pub async fn apply_refund(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<ApplyRefundRequest>,
) -> AppResult<Json<ApplyRefundResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let (order, details) = state
        .orders
        .apply_refund(&id, &payload, operator_id(&headers))
        .await?;
    Ok(Json(ApplyRefundResponse {
        success: true,
        order: Some(order),
        refund_details: Some(details),
    }))
}

/// Cancel the live refund
pub async fn cancel_refund(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<CancelRefundResponse>> {
    let (order, details) = state.orders.cancel_refund(&id).await?;
    Ok(Json(CancelRefundResponse {
        success: true,
        order: Some(order),
        refund_cancellation_details: Some(details),
    }))
}

/// Apply an item-level edit
pub async fn update_item(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<ItemUpdateRequest>,
) -> AppResult<Json<Order>> {
    let operator = operator_id(&headers);
    let order = state
        .orders
        .update_item(&id, &payload, operator.as_deref())
        .await?;
    Ok(Json(order))
}

/// Toggle display flags
pub async fn update_flags(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateFlagsRequest>,
) -> AppResult<Json<Order>> {
    let order = state.orders.update_flags(&id, &payload).await?;
    Ok(Json(order))
}
