//! Order API Module
//!
//! | 路径 | 方法 | 权限 |
//! |------|------|------|
//! | /api/orders | GET | orders:read |
//! | /api/orders/{id} | GET | orders:read |
//! | /api/orders | POST | orders:write |
//! | /api/orders/{id}/close | POST | orders:write |
//! | /api/orders/{id} | DELETE | orders:write |
//! | /api/orders/{id}/status | PATCH | orders:status |

mod handler;

use axum::{
    Router, middleware,
    routing::{get, patch, post},
};

use crate::auth::permissions::{ORDERS_READ, ORDERS_STATUS, ORDERS_WRITE};
use crate::auth::require_permission;
use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .layer(middleware::from_fn(require_permission(ORDERS_READ)));

    // 服务员：下单、结账、撤单
    let write_routes = Router::new()
        .route("/", post(handler::create))
        .route("/{id}/close", post(handler::close))
        .route("/{id}", axum::routing::delete(handler::delete))
        .layer(middleware::from_fn(require_permission(ORDERS_WRITE)));

    // 厨房：出餐进度
    let status_routes = Router::new()
        .route("/{id}/status", patch(handler::update_status))
        .layer(middleware::from_fn(require_permission(ORDERS_STATUS)));

    read_routes.merge(write_routes).merge(status_routes)
}
