//! Profile repository implementation.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use nursenotes_core::{Error, Profile, ProfileRepository, Result, UpdateProfileRequest};

use crate::escape_like;

/// PostgreSQL implementation of ProfileRepository.
pub struct PgProfileRepository {
    pool: Pool<Postgres>,
}

fn map_row_to_profile(row: &sqlx::postgres::PgRow) -> Profile {
    Profile {
        id: row.get("id"),
        full_name: row.get("full_name"),
        avatar_url: row.get("avatar_url"),
    }
}

impl PgProfileRepository {
    /// Create a new PgProfileRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileRepository for PgProfileRepository {
    async fn get(&self, id: Uuid) -> Result<Profile> {
        let row = sqlx::query("SELECT id, full_name, avatar_url FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::ProfileNotFound(id))?;

        Ok(map_row_to_profile(&row))
    }

    async fn update(&self, id: Uuid, req: UpdateProfileRequest) -> Result<Profile> {
        let full_name = req
            .full_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        let avatar_url = req
            .avatar_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());

        let row = sqlx::query(
            r#"UPDATE profiles SET full_name = $1, avatar_url = $2
               WHERE id = $3
               RETURNING id, full_name, avatar_url"#,
        )
        .bind(&full_name)
        .bind(&avatar_url)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::ProfileNotFound(id))?;

        Ok(map_row_to_profile(&row))
    }

    async fn search_by_name(&self, term: &str, limit: i64) -> Result<Vec<Profile>> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }
        let pattern = format!("%{}%", escape_like(term));

        let rows = sqlx::query(
            r#"SELECT id, full_name, avatar_url FROM profiles
               WHERE full_name IS NOT NULL
                 AND full_name ILIKE $1 ESCAPE '\'
               ORDER BY full_name
               LIMIT $2"#,
        )
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(map_row_to_profile).collect())
    }

    async fn list_named(&self, limit: i64) -> Result<Vec<Profile>> {
        let rows = sqlx::query(
            r#"SELECT id, full_name, avatar_url FROM profiles
               WHERE full_name IS NOT NULL
               ORDER BY full_name
               LIMIT $1"#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(map_row_to_profile).collect())
    }
}
