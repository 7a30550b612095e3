//! HTTP handlers for nursenotes-api.

pub mod auth;
pub mod contact;
pub mod notes;
pub mod profiles;

use axum::http::{header, HeaderMap};

use crate::error::ApiError;
use crate::state::AppState;
use nursenotes_core::{AuthGateway, AuthUser};

/// Extract the bearer token from the Authorization header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Expected a bearer token".to_string()))
}

/// Resolve the request's bearer token to its user.
pub async fn current_user(state: &AppState, headers: &HeaderMap) -> Result<AuthUser, ApiError> {
    let token = bearer_token(headers)?;
    Ok(state.db.auth.authenticate(token).await?)
}
