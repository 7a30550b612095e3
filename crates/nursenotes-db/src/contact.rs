//! Contact message repository implementation.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use nursenotes_core::{
    ContactMessage, ContactMessageRepository, CreateContactMessageRequest, Error, Result,
};

/// PostgreSQL implementation of ContactMessageRepository.
pub struct PgContactMessageRepository {
    pool: Pool<Postgres>,
}

fn map_row(row: &sqlx::postgres::PgRow) -> ContactMessage {
    ContactMessage {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        message: row.get("message"),
        created_at: row.get("created_at"),
    }
}

impl PgContactMessageRepository {
    /// Create a new PgContactMessageRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContactMessageRepository for PgContactMessageRepository {
    async fn insert(&self, req: CreateContactMessageRequest) -> Result<ContactMessage> {
        let name = req.name.trim();
        let email = req.email.trim();
        let message = req.message.trim();
        if name.is_empty() || email.is_empty() || message.is_empty() {
            return Err(Error::Validation(
                "Name, email, and message are all required".into(),
            ));
        }

        let row = sqlx::query(
            r#"INSERT INTO contact_messages (id, name, email, message)
               VALUES ($1, $2, $3, $4)
               RETURNING id, name, email, message, created_at"#,
        )
        .bind(Uuid::now_v7())
        .bind(name)
        .bind(email)
        .bind(message)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(map_row(&row))
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<ContactMessage>> {
        let rows = sqlx::query(
            r#"SELECT id, name, email, message, created_at
               FROM contact_messages
               ORDER BY created_at DESC
               LIMIT $1"#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(map_row).collect())
    }
}
