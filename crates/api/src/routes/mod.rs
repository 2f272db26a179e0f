//! HTTP route handlers.

pub mod cart;
pub mod checkout;
pub mod ops;

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use common::AuthToken;

use crate::error::ApiError;

/// Returns the bearer token of the request, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<AuthToken> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(AuthToken::new)
}

/// Returns the bearer token of the request or a 401.
pub fn require_token(headers: &HeaderMap) -> Result<AuthToken, ApiError> {
    bearer_token(headers).ok_or(ApiError::Unauthorized)
}
