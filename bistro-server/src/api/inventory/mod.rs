//! Inventory API Module
//!
//! 全部接口要求 `inventory:manage` 权限 (manager / admin)

mod handler;

use axum::{
    Router, middleware,
    routing::get,
};

use crate::auth::permissions::INVENTORY_MANAGE;
use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/ingredients", get(handler::list_ingredients))
        .route("/api/ingredients/low-stock", get(handler::low_stock))
        .route(
            "/api/supplies",
            get(handler::list_supplies).post(handler::record_supply),
        )
        .layer(middleware::from_fn(require_permission(INVENTORY_MANAGE)))
}
