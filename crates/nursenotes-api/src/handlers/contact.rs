//! Contact form HTTP handler.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::error::ApiError;
use crate::state::AppState;
use nursenotes_core::{ContactMessage, ContactMessageRepository, CreateContactMessageRequest};

/// Submit a contact message.
///
/// # Returns
/// - 201 Created with the stored message
/// - 400 Bad Request when a field is missing
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(req): Json<CreateContactMessageRequest>,
) -> Result<(StatusCode, Json<ContactMessage>), ApiError> {
    let message = state.db.contact.insert(req).await?;
    Ok((StatusCode::CREATED, Json(message)))
}
