//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::OrderNotFound
            | Self::IngredientNotFound
            | Self::DishNotFound
            | Self::TableNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict (lifecycle precondition not met)
            Self::OrderNotReady | Self::OrderNotDeletable => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated | Self::IdentityInvalid => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::PermissionDenied => StatusCode::FORBIDDEN,

            // 503 Service Unavailable (transient errors, client can retry)
            Self::TimeoutError | Self::ClientDisconnected | Self::SystemBusy => {
                StatusCode::SERVICE_UNAVAILABLE
            }

            // 500 Internal Server Error
            Self::InternalError | Self::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (validation / business rule)
            Self::ValidationFailed
            | Self::InvalidRequest
            | Self::OrderEmpty
            | Self::InvalidStatusChange
            | Self::InsufficientStock
            | Self::InvalidSupplyQuantity => StatusCode::BAD_REQUEST,
        }
    }
}
