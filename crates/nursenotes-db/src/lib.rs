//! # nursenotes-db
//!
//! PostgreSQL and filesystem storage layer for nursenotes.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for notes, profiles, and contact messages
//! - The password/session auth gateway
//! - A filesystem object store with public URL issuance
//!
//! ## Example
//!
//! ```rust,ignore
//! use nursenotes_db::Database;
//! use nursenotes_core::{CatalogQuery, NoteRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/nursenotes").await?;
//!     let page = db.notes.catalog_page(&CatalogQuery::default()).await?;
//!     println!("{} notes total", page.total);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod contact;
pub mod notes;
pub mod object_store;
pub mod pool;
pub mod profiles;

// Re-export core types
pub use nursenotes_core::*;

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

// Re-export repository implementations
pub use auth::PgAuthGateway;
pub use contact::PgContactMessageRepository;
pub use notes::PgNoteRepository;
pub use object_store::{compute_content_hash, object_path, FilesystemStore};
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use profiles::PgProfileRepository;

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Note repository for the catalog and uploads.
    pub notes: PgNoteRepository,
    /// Profile repository.
    pub profiles: PgProfileRepository,
    /// Contact message repository.
    pub contact: PgContactMessageRepository,
    /// Auth gateway: accounts and bearer sessions.
    pub auth: PgAuthGateway,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            notes: PgNoteRepository::new(pool.clone()),
            profiles: PgProfileRepository::new(pool.clone()),
            contact: PgContactMessageRepository::new(pool.clone()),
            auth: PgAuthGateway::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_done"), "50\\%\\_done");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }
}
