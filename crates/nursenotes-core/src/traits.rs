//! Core traits for nursenotes abstractions.
//!
//! These traits define the seams between the catalog/upload logic and the
//! gateway that actually persists rows and binary objects, enabling
//! pluggable backends and testability.

use async_trait::async_trait;
use uuid::Uuid;

use crate::catalog::{CatalogPage, CatalogQuery};
use crate::error::Result;
use crate::models::*;

// =============================================================================
// NOTE REPOSITORY
// =============================================================================

/// Repository for note rows.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Insert a new note and return the stored row.
    async fn insert(&self, req: CreateNoteRequest) -> Result<Note>;

    /// Fetch one catalog page plus the exact matching-row count.
    async fn catalog_page(&self, query: &CatalogQuery) -> Result<CatalogPage>;

    /// The most recently created notes, joined with uploader names.
    async fn featured(&self, limit: i64) -> Result<Vec<NoteSummary>>;

    /// Fetch a note by id.
    async fn fetch(&self, id: Uuid) -> Result<Note>;

    /// All notes uploaded by one user, newest first.
    async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<Note>>;

    /// Delete a note, verifying ownership. Returns the deleted row so the
    /// caller can clean up its stored object.
    async fn delete_owned(&self, id: Uuid, owner: Uuid) -> Result<Note>;
}

// =============================================================================
// PROFILE REPOSITORY
// =============================================================================

/// Repository for user profiles.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Fetch a profile by id.
    async fn get(&self, id: Uuid) -> Result<Profile>;

    /// Update one's own profile fields.
    async fn update(&self, id: Uuid, req: UpdateProfileRequest) -> Result<Profile>;

    /// Case-insensitive substring search on full name; only named profiles.
    async fn search_by_name(&self, term: &str, limit: i64) -> Result<Vec<Profile>>;

    /// A short list of named profiles for the community directory.
    async fn list_named(&self, limit: i64) -> Result<Vec<Profile>>;
}

// =============================================================================
// CONTACT MESSAGES
// =============================================================================

/// Repository for contact form submissions.
#[async_trait]
pub trait ContactMessageRepository: Send + Sync {
    /// Store a submitted message.
    async fn insert(&self, req: CreateContactMessageRequest) -> Result<ContactMessage>;

    /// Most recent messages, newest first.
    async fn list_recent(&self, limit: i64) -> Result<Vec<ContactMessage>>;
}

// =============================================================================
// AUTH GATEWAY
// =============================================================================

/// Authentication gateway: registration, credential checks, and the bearer
/// session lifecycle. The implementation owns hashing and expiry policy.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Register a new account and open a session. A profile row is created
    /// alongside the user. Fails with `Error::AccountExists` on a duplicate
    /// email.
    async fn sign_up(&self, credentials: Credentials) -> Result<AuthSession>;

    /// Verify credentials and open a session. Fails with
    /// `Error::Unauthorized` on a bad email/password pair.
    async fn sign_in(&self, credentials: Credentials) -> Result<AuthSession>;

    /// Resolve a bearer token to its user, refreshing the session's expiry.
    async fn authenticate(&self, token: &str) -> Result<AuthUser>;

    /// Revoke a session token.
    async fn sign_out(&self, token: &str) -> Result<()>;
}

// =============================================================================
// OBJECT STORE
// =============================================================================

/// Binary object storage with public URL issuance.
///
/// Keys are flat, globally unique strings chosen by the caller
/// (`{uuid}.{ext}` for uploads).
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store an object under `key`.
    async fn put(&self, key: &str, data: &[u8]) -> Result<()>;

    /// Delete the object at `key`; deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Whether an object exists at `key`.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Public URL for a stored key. Synchronous: derived, not fetched.
    fn public_url(&self, key: &str) -> String;
}
