//! Verification token repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use emporium_core::UserId;

use super::RepositoryError;
use super::users::USER_COLUMNS;
use crate::models::{User, VerificationToken};

/// Repository for email verification tokens.
pub struct VerificationTokenRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> VerificationTokenRepository<'a> {
    /// Create a new verification token repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Look up a token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find(&self, token: Uuid) -> Result<Option<VerificationToken>, RepositoryError> {
        let row = sqlx::query_as::<_, VerificationToken>(
            r"
            SELECT id, token, user_id, expires_at, created_at
            FROM verification_tokens
            WHERE token = $1
            ",
        )
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Delete a single token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, token: Uuid) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM verification_tokens WHERE token = $1")
            .bind(token)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Redeem a token: mark its user verified and drop every token the user has.
    ///
    /// The token row is claimed with `DELETE ... RETURNING` inside the
    /// transaction, so two concurrent redemptions cannot both succeed.
    /// Returns `None` when the token no longer exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn redeem(&self, token: Uuid) -> Result<Option<User>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let user_id: Option<UserId> =
            sqlx::query_scalar("DELETE FROM verification_tokens WHERE token = $1 RETURNING user_id")
                .bind(token)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(user_id) = user_id else {
            return Ok(None);
        };

        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET is_verified = TRUE, updated_at = NOW() WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM verification_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(user))
    }

    /// Replace all of a user's tokens with a fresh one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn replace_for_user(
        &self,
        user_id: UserId,
        token: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM verification_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r"
            INSERT INTO verification_tokens (token, user_id, expires_at)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Delete every token that expired before `now`. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM verification_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
