//! Application state shared across handlers.

use std::sync::Arc;

use nursenotes_core::{NoteUploader, SessionStore};
use nursenotes_db::{Database, FilesystemStore};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    /// Object store for uploaded note files.
    pub store: Arc<FilesystemStore>,
    /// Two-phase upload runner (store + metadata + compensation).
    pub uploader: Arc<NoteUploader>,
    /// Process-wide auth event store.
    pub sessions: Arc<SessionStore>,
}
