//! Password and session auth gateway.
//!
//! Accounts are email/password; sessions are opaque bearer tokens stored
//! hashed, with a sliding expiry window so active sessions stay alive while
//! idle ones lapse. The profile row is created in the same transaction as
//! the user row, so every user has one from the moment of registration.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::{Pool, Postgres, Row};
use tracing::{debug, info};
use uuid::Uuid;

use nursenotes_core::defaults::{MIN_PASSWORD_LEN, SESSION_TTL_SECS};
use nursenotes_core::{AuthGateway, AuthSession, AuthUser, Credentials, Error, Result};

/// PostgreSQL implementation of AuthGateway.
pub struct PgAuthGateway {
    pool: Pool<Postgres>,
}

impl PgAuthGateway {
    /// Create a new PgAuthGateway with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Generate an opaque bearer token (32 random bytes, base64url).
    fn generate_token() -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Hash a secret using SHA256.
    fn hash_secret(secret: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Verify a secret against its hash.
    fn verify_secret(secret: &str, hash: &str) -> bool {
        Self::hash_secret(secret) == hash
    }

    fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    fn check_credentials(credentials: &Credentials) -> Result<String> {
        let email = Self::normalize_email(&credentials.email);
        if email.is_empty() || !email.contains('@') {
            return Err(Error::Validation("A valid email address is required".into()));
        }
        if credentials.password.trim().len() < MIN_PASSWORD_LEN {
            return Err(Error::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(email)
    }

    /// Open a session for `user` and return it with the fresh token.
    async fn open_session(&self, user: AuthUser) -> Result<AuthSession> {
        let token = Self::generate_token();
        let token_hash = Self::hash_secret(&token);
        let now = Utc::now();
        let expires_at = now + Duration::seconds(SESSION_TTL_SECS);

        sqlx::query(
            r#"INSERT INTO auth_session (id, user_id, token_hash, expires_at, last_used_at)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(Uuid::now_v7())
        .bind(user.id)
        .bind(&token_hash)
        .bind(expires_at)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "auth",
            component = "session",
            op = "open",
            user_id = %user.id,
            "Session opened"
        );

        Ok(AuthSession {
            user,
            token,
            expires_at,
        })
    }
}

#[async_trait]
impl AuthGateway for PgAuthGateway {
    async fn sign_up(&self, credentials: Credentials) -> Result<AuthSession> {
        let email = Self::check_credentials(&credentials)?;
        let password_hash = Self::hash_secret(credentials.password.trim());
        let user_id = Uuid::now_v7();

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let inserted = sqlx::query(
            "INSERT INTO app_user (id, email, password_hash) VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(&email)
        .bind(&password_hash)
        .execute(&mut *tx)
        .await;

        if let Err(e) = inserted {
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                return Err(Error::AccountExists(email));
            }
            return Err(Error::Database(e));
        }

        // Every user gets a profile row from the start; name and avatar are
        // filled in later through the profile screen.
        sqlx::query("INSERT INTO profiles (id) VALUES ($1)")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "auth",
            op = "sign_up",
            user_id = %user_id,
            "Account registered"
        );

        self.open_session(AuthUser { id: user_id, email }).await
    }

    async fn sign_in(&self, credentials: Credentials) -> Result<AuthSession> {
        let email = Self::normalize_email(&credentials.email);

        let row = sqlx::query("SELECT id, email, password_hash FROM app_user WHERE email = $1")
            .bind(&email)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        let Some(row) = row else {
            return Err(Error::Unauthorized("Invalid login credentials".into()));
        };

        let password_hash: String = row.get("password_hash");
        if !Self::verify_secret(credentials.password.trim(), &password_hash) {
            return Err(Error::Unauthorized("Invalid login credentials".into()));
        }

        let user = AuthUser {
            id: row.get("id"),
            email: row.get("email"),
        };

        info!(
            subsystem = "auth",
            op = "sign_in",
            user_id = %user.id,
            "Signed in"
        );

        self.open_session(user).await
    }

    async fn authenticate(&self, token: &str) -> Result<AuthUser> {
        let token_hash = Self::hash_secret(token);
        let now = Utc::now();

        let row = sqlx::query(
            r#"SELECT u.id, u.email
               FROM auth_session s
               JOIN app_user u ON u.id = s.user_id
               WHERE s.token_hash = $1 AND s.expires_at > $2"#,
        )
        .bind(&token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        let Some(row) = row else {
            return Err(Error::Unauthorized("Session is missing or expired".into()));
        };

        // Sliding window: each authenticated request pushes expiry out.
        let new_expiry = now + Duration::seconds(SESSION_TTL_SECS);
        sqlx::query(
            "UPDATE auth_session SET expires_at = $1, last_used_at = $2 WHERE token_hash = $3",
        )
        .bind(new_expiry)
        .bind(now)
        .bind(&token_hash)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(AuthUser {
            id: row.get("id"),
            email: row.get("email"),
        })
    }

    async fn sign_out(&self, token: &str) -> Result<()> {
        let token_hash = Self::hash_secret(token);
        sqlx::query("DELETE FROM auth_session WHERE token_hash = $1")
            .bind(&token_hash)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let secret = "correct horse battery staple";
        let hash = PgAuthGateway::hash_secret(secret);
        assert!(PgAuthGateway::verify_secret(secret, &hash));
        assert!(!PgAuthGateway::verify_secret("wrong secret", &hash));
    }

    #[test]
    fn test_tokens_are_unique_and_url_safe() {
        let a = PgAuthGateway::generate_token();
        let b = PgAuthGateway::generate_token();
        assert_ne!(a, b);
        assert!(a.len() >= 40);
        assert!(!a.contains('+') && !a.contains('/') && !a.contains('='));
    }

    #[test]
    fn test_email_normalization() {
        assert_eq!(
            PgAuthGateway::normalize_email("  Nurse@Example.COM "),
            "nurse@example.com"
        );
    }

    #[test]
    fn test_credential_checks() {
        let ok = Credentials {
            email: "nurse@example.com".into(),
            password: "secret1".into(),
        };
        assert!(PgAuthGateway::check_credentials(&ok).is_ok());

        let short = Credentials {
            email: "nurse@example.com".into(),
            password: "abc".into(),
        };
        assert!(matches!(
            PgAuthGateway::check_credentials(&short),
            Err(Error::Validation(_))
        ));

        let bad_email = Credentials {
            email: "not-an-email".into(),
            password: "secret1".into(),
        };
        assert!(matches!(
            PgAuthGateway::check_credentials(&bad_email),
            Err(Error::Validation(_))
        ));
    }
}
