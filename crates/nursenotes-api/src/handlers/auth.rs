//! Auth HTTP handlers: registration, sign-in, sign-out.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use crate::error::ApiError;
use crate::state::AppState;
use nursenotes_core::{AuthGateway, AuthSession, Credentials};

use super::bearer_token;

/// Register a new account and open a session.
///
/// # Returns
/// - 201 Created with the session (user, bearer token, expiry)
/// - 400 Bad Request on an invalid email or short password
/// - 409 Conflict when the email is already registered
pub async fn sign_up(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<(StatusCode, Json<AuthSession>), ApiError> {
    let session = state.db.auth.sign_up(credentials).await?;
    state.sessions.signed_in(session.user.clone());
    Ok((StatusCode::CREATED, Json(session)))
}

/// Verify credentials and open a session.
///
/// # Returns
/// - 200 OK with the session
/// - 401 Unauthorized on a bad email/password pair
pub async fn sign_in(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<AuthSession>, ApiError> {
    let session = state.db.auth.sign_in(credentials).await?;
    state.sessions.signed_in(session.user.clone());
    Ok(Json(session))
}

/// Revoke the presented session token.
pub async fn sign_out(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let token = bearer_token(&headers)?;
    state.db.auth.sign_out(token).await?;
    state.sessions.signed_out();
    Ok(StatusCode::NO_CONTENT)
}
