//! CurrentUser Extractor
//!
//! Handlers take `CurrentUser` as an argument; the value injected by
//! [`require_auth`](crate::auth::require_auth) is reused when present.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::CurrentUser;
use crate::security_log;
use crate::utils::AppError;

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Check if already extracted (from middleware)
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        match CurrentUser::from_headers(&parts.headers) {
            Ok(user) => {
                parts.extensions.insert(user.clone());
                Ok(user)
            }
            Err(e) => {
                security_log!(
                    "WARN",
                    "auth_failed",
                    error = e.message.clone(),
                    uri = format!("{:?}", parts.uri)
                );
                Err(e)
            }
        }
    }
}
