//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`orders`] - 订单生命周期接口
//! - [`inventory`] - 原料库存与进货接口

pub mod health;
pub mod inventory;
pub mod orders;

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::orders::OpContext;
use crate::utils::{AppError, AppResult};

/// 在阻塞线程池中执行一次引擎调用
///
/// 上下文带请求超时；handler future 被丢弃（客户端断开）时取消令牌随之触发，
/// 尚未提交的事务会被回滚。
pub(crate) async fn run_blocking<T, E, F>(timeout: Duration, op: F) -> AppResult<T>
where
    F: FnOnce(OpContext) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<AppError> + Send + 'static,
{
    let token = CancellationToken::new();
    let _disconnect_guard = token.clone().drop_guard();
    let ctx = OpContext::with_timeout(timeout).cancellation(token);

    tokio::task::spawn_blocking(move || op(ctx))
        .await
        .map_err(|e| AppError::internal(format!("Blocking task failed: {e}")))?
        .map_err(Into::into)
}
