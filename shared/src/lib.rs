//! Shared types for the Bistro back-office
//!
//! Domain models, order lifecycle types, events and the unified error /
//! response structures used by the server and by API clients.

pub mod error;
pub mod models;
pub mod order;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use http;
pub use rust_decimal::Decimal;
pub use serde::{Deserialize, Serialize};
