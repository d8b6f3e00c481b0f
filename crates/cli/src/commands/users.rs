//! User maintenance commands.
//!
//! # Usage
//!
//! ```bash
//! emporium-cli users list --limit 20
//! emporium-cli users prune-unverified --older-than-hours 48
//! emporium-cli users promote --email admin@example.com
//! ```

use chrono::{Duration, Utc};

use emporium_api::db::{RepositoryError, UserRepository};
use emporium_api::models::User;
use emporium_core::{Email, UserRole};

use super::{CliError, connect};

/// Print the newest users.
///
/// # Errors
///
/// Returns `CliError` if the query fails.
pub async fn list(limit: i64) -> Result<(), CliError> {
    let pool = connect().await?;
    let users = UserRepository::new(&pool).list(limit).await?;

    #[allow(clippy::print_stdout)]
    {
        println!(
            "{:>6}  {:<40}  {:<8}  {:<8}  {:<6}  created",
            "id", "email", "role", "verified", "active"
        );
        for user in &users {
            println!("{}", format_row(user));
        }
        println!("{} user(s)", users.len());
    }
    Ok(())
}

/// Delete unverified accounts created more than `older_than_hours` ago.
///
/// Accounts that already placed orders are kept.
///
/// # Errors
///
/// Returns `CliError` if the query fails.
pub async fn prune_unverified(older_than_hours: u32) -> Result<(), CliError> {
    let pool = connect().await?;
    let cutoff = Utc::now() - Duration::hours(i64::from(older_than_hours));

    let deleted = UserRepository::new(&pool)
        .delete_unverified_before(cutoff)
        .await?;

    tracing::info!(deleted, %cutoff, "Pruned unverified users");
    Ok(())
}

/// Give an existing user the admin role.
///
/// # Errors
///
/// Returns `CliError::InvalidEmail` for a malformed email and
/// `CliError::UserNotFound` if nobody has it.
pub async fn promote(email: &str) -> Result<(), CliError> {
    let email = Email::parse(email).map_err(|e| CliError::InvalidEmail(e.to_string()))?;
    let pool = connect().await?;

    let user = UserRepository::new(&pool)
        .set_role(&email, UserRole::Admin)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => CliError::UserNotFound(email.to_string()),
            other => CliError::Repository(other),
        })?;

    if !user.is_verified {
        tracing::warn!(user_id = %user.id, "Promoted user has not verified their email yet");
    }
    tracing::info!(user_id = %user.id, email = %user.email, "User promoted to admin");
    Ok(())
}

fn format_row(user: &User) -> String {
    format!(
        "{:>6}  {:<40}  {:<8}  {:<8}  {:<6}  {}",
        user.id.as_i32(),
        user.email.as_str(),
        user.role.to_string(),
        if user.is_verified { "yes" } else { "no" },
        if user.is_active { "yes" } else { "no" },
        user.created_at.format("%Y-%m-%d %H:%M"),
    )
}
