//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong email or password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Account is disabled.
    #[error("inactive user")]
    InactiveUser,

    /// Account exists but has not confirmed its email.
    #[error("email not verified")]
    EmailNotVerified,

    /// Email is already registered.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Verification token does not exist or was already used.
    #[error("invalid verification token")]
    InvalidVerificationToken,

    /// Verification token is past its expiry.
    #[error("verification token expired")]
    VerificationTokenExpired,

    /// Access token is malformed, tampered, expired or signed elsewhere.
    #[error("invalid access token")]
    InvalidToken,

    /// Access token was revoked by logout or refresh.
    #[error("access token revoked")]
    TokenRevoked,

    /// Token subject no longer exists.
    #[error("user not found")]
    UserNotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Token signing error.
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Whether this is a server-side failure rather than a client mistake.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Repository(_) | Self::Token(_) | Self::PasswordHash)
    }
}
