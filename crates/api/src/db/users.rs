//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use emporium_core::{Email, UserId, UserRole};

use super::RepositoryError;
use crate::models::{ProfileChanges, User};

/// Columns selected for a [`User`].
pub(crate) const USER_COLUMNS: &str = "id, email, hashed_password, is_active, is_verified, \
     first_name, last_name, phone, \
     shipping_street, shipping_city, shipping_postal_code, shipping_country, shipping_state, \
     company_name, company_tax_id, company_address_street, company_address_city, \
     company_address_postal_code, company_address_country, company_address_state, \
     role, created_at, updated_at";

/// Fields collected at registration.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub email: &'a Email,
    pub hashed_password: &'a str,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub phone: Option<&'a str>,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Create an unverified user together with their first verification token.
    ///
    /// Both rows are written in one transaction, so a user never exists
    /// without a way to verify.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_unverified(
        &self,
        new_user: &NewUser<'_>,
        token: Uuid,
        token_expires_at: DateTime<Utc>,
    ) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, hashed_password, first_name, last_name, phone) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(new_user.email)
        .bind(new_user.hashed_password)
        .bind(new_user.first_name)
        .bind(new_user.last_name)
        .bind(new_user.phone)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "email already exists"))?;

        sqlx::query(
            r"
            INSERT INTO verification_tokens (token, user_id, expires_at)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(token)
        .bind(user.id)
        .bind(token_expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(user)
    }

    /// Apply profile changes. Fields left as `None` keep their value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_profile(
        &self,
        id: UserId,
        changes: &ProfileChanges,
    ) -> Result<User, RepositoryError> {
        let shipping = &changes.shipping;
        let company = &changes.company;

        sqlx::query_as::<_, User>(&format!(
            r"
            UPDATE users SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                phone = COALESCE($4, phone),
                shipping_street = COALESCE($5, shipping_street),
                shipping_city = COALESCE($6, shipping_city),
                shipping_postal_code = COALESCE($7, shipping_postal_code),
                shipping_country = COALESCE($8, shipping_country),
                shipping_state = COALESCE($9, shipping_state),
                company_name = COALESCE($10, company_name),
                company_tax_id = COALESCE($11, company_tax_id),
                company_address_street = COALESCE($12, company_address_street),
                company_address_city = COALESCE($13, company_address_city),
                company_address_postal_code = COALESCE($14, company_address_postal_code),
                company_address_country = COALESCE($15, company_address_country),
                company_address_state = COALESCE($16, company_address_state),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(changes.first_name.as_deref())
        .bind(changes.last_name.as_deref())
        .bind(changes.phone.as_deref())
        .bind(shipping.shipping_street.as_deref())
        .bind(shipping.shipping_city.as_deref())
        .bind(shipping.shipping_postal_code.as_deref())
        .bind(shipping.shipping_country.as_deref())
        .bind(shipping.shipping_state.as_deref())
        .bind(company.company_name.as_deref())
        .bind(company.company_tax_id.as_deref())
        .bind(company.company_address_street.as_deref())
        .bind(company.company_address_city.as_deref())
        .bind(company.company_address_postal_code.as_deref())
        .bind(company.company_address_country.as_deref())
        .bind(company.company_address_state.as_deref())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// List users, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, limit: i64) -> Result<Vec<User>, RepositoryError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(users)
    }

    /// Change a user's role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has this email.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_role(&self, email: &Email, role: UserRole) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET role = $2, updated_at = NOW() WHERE email = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(email)
        .bind(role)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete accounts that never verified their email and were created
    /// before `cutoff`. Returns the number of deleted users.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_unverified_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM users
            WHERE is_verified = FALSE AND created_at < $1
              AND NOT EXISTS (SELECT 1 FROM orders WHERE orders.user_id = users.id)
            ",
        )
        .bind(cutoff)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
