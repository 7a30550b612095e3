//! API error type and HTTP response mapping.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use nursenotes_core::Error;

/// Errors surfaced by HTTP handlers.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match &err {
            Error::Validation(msg) => ApiError::BadRequest(msg.clone()),
            Error::NotFound(msg) => ApiError::NotFound(msg.clone()),
            Error::NoteNotFound(_) | Error::ProfileNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            Error::Unauthorized(msg) => ApiError::Unauthorized(msg.clone()),
            Error::Forbidden(msg) => ApiError::Forbidden(msg.clone()),
            Error::AccountExists(_) => ApiError::Conflict(
                "This email is already registered. Please sign in instead.".to_string(),
            ),
            Error::Database(sqlx_err) => {
                let msg = sqlx_err.to_string();
                if msg.contains("duplicate key") || msg.contains("unique constraint") {
                    return ApiError::Conflict(msg);
                }
                ApiError::Internal(err.to_string())
            }
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let api: ApiError = Error::Validation("title is required".into()).into();
        assert!(matches!(api, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_note_not_found_maps_to_not_found() {
        let api: ApiError = Error::NoteNotFound(Uuid::nil()).into();
        assert!(matches!(api, ApiError::NotFound(_)));
    }

    #[test]
    fn test_account_exists_maps_to_conflict() {
        let api: ApiError = Error::AccountExists("a@b.c".into()).into();
        match api {
            ApiError::Conflict(msg) => assert!(msg.contains("already registered")),
            other => panic!("expected Conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_storage_maps_to_internal() {
        let api: ApiError = Error::Storage("disk full".into()).into();
        assert!(matches!(api, ApiError::Internal(_)));
    }
}
