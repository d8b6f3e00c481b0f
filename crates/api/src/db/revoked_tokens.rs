//! Revoked access token repository.
//!
//! Access tokens are stateless JWTs; a row here marks a token's `jti` as
//! unusable until the token would have expired anyway.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use emporium_core::UserId;

use super::RepositoryError;

/// Repository for revoked token IDs.
pub struct RevokedTokenRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RevokedTokenRepository<'a> {
    /// Create a new revoked token repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a token as revoked. Revoking twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn revoke(
        &self,
        jti: Uuid,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO revoked_tokens (jti, user_id, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (jti) DO NOTHING
            ",
        )
        .bind(jti)
        .bind(user_id)
        .bind(expires_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Whether a token ID has been revoked.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn is_revoked(&self, jti: Uuid) -> Result<bool, RepositoryError> {
        let revoked: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM revoked_tokens WHERE jti = $1)")
                .bind(jti)
                .fetch_one(self.pool)
                .await?;

        Ok(revoked)
    }

    /// Delete entries for tokens that have expired by `now`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
