//! Error types for nursenotes.

use thiserror::Error;

/// Result type alias using nursenotes' Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for nursenotes operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Note not found
    #[error("Note not found: {0}")]
    NoteNotFound(uuid::Uuid),

    /// Profile not found
    #[error("Profile not found: {0}")]
    ProfileNotFound(uuid::Uuid),

    /// Input rejected before any gateway call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Object storage operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authentication failed (bad credentials, missing/expired session)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed to act on this resource
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Email already registered
    #[error("Account already exists: {0}")]
    AccountExists(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("test resource".to_string());
        assert_eq!(err.to_string(), "Not found: test resource");
    }

    #[test]
    fn test_error_display_note_not_found() {
        let id = Uuid::nil();
        let err = Error::NoteNotFound(id);
        assert_eq!(err.to_string(), format!("Note not found: {}", id));
    }

    #[test]
    fn test_error_display_profile_not_found() {
        let id = Uuid::new_v4();
        let err = Error::ProfileNotFound(id);
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn test_error_display_validation() {
        let err = Error::Validation("title is required".to_string());
        assert_eq!(err.to_string(), "Validation error: title is required");
    }

    #[test]
    fn test_error_display_storage() {
        let err = Error::Storage("write failed".to_string());
        assert_eq!(err.to_string(), "Storage error: write failed");
    }

    #[test]
    fn test_error_display_unauthorized() {
        let err = Error::Unauthorized("invalid token".to_string());
        assert_eq!(err.to_string(), "Unauthorized: invalid token");
    }

    #[test]
    fn test_error_display_forbidden() {
        let err = Error::Forbidden("not the owner".to_string());
        assert_eq!(err.to_string(), "Forbidden: not the owner");
    }

    #[test]
    fn test_error_display_account_exists() {
        let err = Error::AccountExists("nurse@example.com".to_string());
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number");
        assert!(json_err.is_err());

        let err: Error = json_err.unwrap_err().into();
        match err {
            Error::Serialization(msg) => {
                assert!(!msg.is_empty());
            }
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        match err {
            Error::Io(_) => {}
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn test_result_type_ok() {
        fn get_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(get_result().unwrap(), 42);
    }
}
