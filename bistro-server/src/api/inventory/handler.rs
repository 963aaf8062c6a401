//! Inventory API Handlers

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;

use crate::api::run_blocking;
use crate::core::ServerState;
use crate::services::SupplyReceipt;
use crate::utils::validation::{MAX_NAME_LEN, validate_required_text};
use crate::utils::{ApiResponse, AppResult};
use shared::models::{Ingredient, Supply, SupplyCreate};

/// GET /api/ingredients - 全部原料
pub async fn list_ingredients(
    State(state): State<ServerState>,
) -> AppResult<ApiResponse<Vec<Ingredient>>> {
    let inventory = state.inventory.clone();
    let list = run_blocking(state.config.request_timeout(), move |ctx| {
        inventory.list_ingredients(&ctx)
    })
    .await?;
    Ok(ApiResponse::success(list))
}

/// GET /api/ingredients/low-stock - 库存不高于阈值的原料
pub async fn low_stock(
    State(state): State<ServerState>,
) -> AppResult<ApiResponse<Vec<Ingredient>>> {
    let inventory = state.inventory.clone();
    let list = run_blocking(state.config.request_timeout(), move |ctx| {
        inventory.low_stock(&ctx)
    })
    .await?;
    Ok(ApiResponse::success(list))
}

#[derive(Debug, Deserialize)]
pub struct SupplyQuery {
    pub ingredient_id: Option<i64>,
}

/// GET /api/supplies[?ingredient_id=] - 进货记录，最新在前
pub async fn list_supplies(
    State(state): State<ServerState>,
    Query(query): Query<SupplyQuery>,
) -> AppResult<ApiResponse<Vec<Supply>>> {
    let inventory = state.inventory.clone();
    let list = run_blocking(state.config.request_timeout(), move |ctx| {
        inventory.list_supplies(&ctx, query.ingredient_id)
    })
    .await?;
    Ok(ApiResponse::success(list))
}

/// POST /api/supplies - 登记进货
pub async fn record_supply(
    State(state): State<ServerState>,
    Json(payload): Json<SupplyCreate>,
) -> AppResult<ApiResponse<SupplyReceipt>> {
    validate_required_text(&payload.supplier_name, "supplier_name", MAX_NAME_LEN)?;

    let inventory = state.inventory.clone();
    let receipt = run_blocking(state.config.request_timeout(), move |ctx| {
        inventory.record_supply(&ctx, payload)
    })
    .await?;
    Ok(ApiResponse::success(receipt))
}
