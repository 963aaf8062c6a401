use super::super::context::Interrupted;
use super::super::store::StoreError;
use super::super::txn::TxnError;
use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::order::OrderStatus;
use thiserror::Error;

/// Manager errors
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Order not found: {0}")]
    OrderNotFound(i64),

    #[error("Dish not found: {0}")]
    DishNotFound(i64),

    #[error("Table not found: {0}")]
    TableNotFound(i64),

    #[error("Ingredient not found: {0}")]
    IngredientNotFound(i64),

    #[error(
        "Insufficient stock for ingredient {ingredient_id}: required {required}, available {available}"
    )]
    InsufficientStock {
        ingredient_id: i64,
        required: Decimal,
        available: Decimal,
    },

    #[error("Invalid status change: {from} -> {to}")]
    InvalidStatusChange { from: OrderStatus, to: OrderStatus },

    #[error("Order {order_id} is not ready (status: {status})")]
    OrderNotReady { order_id: i64, status: OrderStatus },

    #[error("Order {order_id} cannot be deleted (status: {status})")]
    OrderNotDeletable { order_id: i64, status: OrderStatus },

    #[error("Order must contain at least one item")]
    EmptyOrder,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation deadline exceeded")]
    DeadlineExceeded,
}

impl From<Interrupted> for ManagerError {
    fn from(reason: Interrupted) -> Self {
        match reason {
            Interrupted::Cancelled => ManagerError::Cancelled,
            Interrupted::DeadlineExceeded => ManagerError::DeadlineExceeded,
        }
    }
}

impl TxnError for ManagerError {
    fn is_retryable(&self) -> bool {
        matches!(self, ManagerError::Storage(e) if e.is_retryable())
    }
}

/// 将引擎错误转换为统一错误码（HTTP 映射在 ErrorCode::http_status）
impl From<ManagerError> for AppError {
    fn from(err: ManagerError) -> Self {
        let message = err.to_string();
        match err {
            ManagerError::Storage(StoreError::Conflict(_)) => {
                AppError::with_message(ErrorCode::SystemBusy, message)
            }
            ManagerError::Storage(e) => {
                tracing::error!(error = %e, "Storage error occurred");
                AppError::database(message)
            }
            ManagerError::OrderNotFound(id) => {
                AppError::with_message(ErrorCode::OrderNotFound, message).with_detail("order_id", id)
            }
            ManagerError::DishNotFound(id) => {
                AppError::with_message(ErrorCode::DishNotFound, message).with_detail("dish_id", id)
            }
            ManagerError::TableNotFound(id) => {
                AppError::with_message(ErrorCode::TableNotFound, message).with_detail("table_id", id)
            }
            ManagerError::IngredientNotFound(id) => {
                AppError::with_message(ErrorCode::IngredientNotFound, message)
                    .with_detail("ingredient_id", id)
            }
            ManagerError::InsufficientStock {
                ingredient_id,
                required,
                available,
            } => AppError::with_message(ErrorCode::InsufficientStock, message)
                .with_detail("ingredient_id", ingredient_id)
                .with_detail("required", required.to_string())
                .with_detail("available", available.to_string()),
            ManagerError::InvalidStatusChange { from, to } => {
                AppError::with_message(ErrorCode::InvalidStatusChange, message)
                    .with_detail("from", from.as_str())
                    .with_detail("to", to.as_str())
            }
            ManagerError::OrderNotReady { order_id, status } => {
                AppError::with_message(ErrorCode::OrderNotReady, message)
                    .with_detail("order_id", order_id)
                    .with_detail("status", status.as_str())
            }
            ManagerError::OrderNotDeletable { order_id, status } => {
                AppError::with_message(ErrorCode::OrderNotDeletable, message)
                    .with_detail("order_id", order_id)
                    .with_detail("status", status.as_str())
            }
            ManagerError::EmptyOrder => AppError::with_message(ErrorCode::OrderEmpty, message),
            ManagerError::Validation(msg) => AppError::validation(msg),
            ManagerError::Cancelled => AppError::client_disconnected(),
            ManagerError::DeadlineExceeded => AppError::timeout(),
        }
    }
}

pub type ManagerResult<T> = Result<T, ManagerError>;
