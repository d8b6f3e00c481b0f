//! Token housekeeping.
//!
//! # Usage
//!
//! ```bash
//! emporium-cli tokens cleanup
//! ```

use chrono::Utc;

use emporium_api::db::{RevokedTokenRepository, VerificationTokenRepository};

use super::{CliError, connect};

/// Delete expired verification tokens and revocations of access tokens
/// that have expired on their own.
///
/// # Errors
///
/// Returns `CliError` if a query fails.
pub async fn cleanup() -> Result<(), CliError> {
    let pool = connect().await?;
    let now = Utc::now();

    let verification = VerificationTokenRepository::new(&pool)
        .delete_expired(now)
        .await?;
    let revoked = RevokedTokenRepository::new(&pool)
        .delete_expired(now)
        .await?;

    tracing::info!(
        verification_tokens = verification,
        revoked_tokens = revoked,
        "Expired tokens removed"
    );
    Ok(())
}
