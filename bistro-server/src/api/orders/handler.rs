//! Order API Handlers

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::run_blocking;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::orders::{CreateOrderInput, Order, OrderLineInput, OrderStatus};
use crate::utils::validation::{MAX_NOTE_LEN, validate_optional_text};
use crate::utils::{ApiResponse, AppError, AppResult};

/// Create order request body (waiter taken from the caller's identity)
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub table_id: i64,
    #[serde(default)]
    pub notes: Option<String>,
    pub items: Vec<OrderLineInput>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

fn parse_status(raw: &str) -> AppResult<OrderStatus> {
    raw.parse::<OrderStatus>()
        .map_err(|e| AppError::invalid_request(e.to_string()))
}

/// GET /api/orders?status= - 订单列表 (可按状态过滤)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<Order>>> {
    let status = query.status.as_deref().map(parse_status).transpose()?;
    let orders = state.orders.clone();
    let list = run_blocking(state.config.request_timeout(), move |ctx| {
        orders.list_orders(&ctx, status)
    })
    .await?;
    Ok(ApiResponse::success(list))
}

/// GET /api/orders/:id - 获取订单 (含明细)
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<Order>> {
    let orders = state.orders.clone();
    let order = run_blocking(state.config.request_timeout(), move |ctx| {
        orders.get_order(&ctx, id)
    })
    .await?;
    Ok(ApiResponse::success(order))
}

/// POST /api/orders - 下单
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<ApiResponse<Order>> {
    validate_optional_text(&payload.notes, "notes", MAX_NOTE_LEN)?;
    for line in &payload.items {
        validate_optional_text(&line.notes, "item notes", MAX_NOTE_LEN)?;
    }

    let input = CreateOrderInput {
        table_id: payload.table_id,
        waiter_id: user.id,
        notes: payload.notes,
        items: payload.items,
    };
    let orders = state.orders.clone();
    let order = run_blocking(state.config.request_timeout(), move |ctx| {
        orders.create_order(&ctx, input)
    })
    .await?;
    Ok(ApiResponse::success(order))
}

/// PATCH /api/orders/:id/status - 推进订单状态
pub async fn update_status(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<ApiResponse<Order>> {
    let status = parse_status(&payload.status)?;
    let orders = state.orders.clone();
    let order = run_blocking(state.config.request_timeout(), move |ctx| {
        orders.update_status(&ctx, id, status)
    })
    .await?;
    Ok(ApiResponse::success(order))
}

/// POST /api/orders/:id/close - 结账
pub async fn close(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<Order>> {
    let orders = state.orders.clone();
    let order = run_blocking(state.config.request_timeout(), move |ctx| {
        orders.close_order(&ctx, id)
    })
    .await?;
    Ok(ApiResponse::success(order))
}

/// DELETE /api/orders/:id - 撤单 (仅 new 状态)
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<()>> {
    let orders = state.orders.clone();
    run_blocking(state.config.request_timeout(), move |ctx| {
        orders.delete_order(&ctx, id)
    })
    .await?;
    Ok(ApiResponse::ok())
}
