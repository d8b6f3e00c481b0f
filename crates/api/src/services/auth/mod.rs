//! Authentication service.
//!
//! Registration with email verification, password login, and stateless
//! JWT access tokens with server-side revocation.

mod error;
pub mod password;
pub mod tokens;

pub use error::AuthError;
pub use password::{check_password_policy, hash_password, reject_unknown_account, verify_password};
pub use tokens::{Claims, IssuedToken, JwtKeys};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use emporium_core::{Email, UserId};

use crate::db::{
    NewUser, RepositoryError, RevokedTokenRepository, UserRepository, VerificationTokenRepository,
};
use crate::models::{User, VerificationToken};
use crate::services::email::{Branding, EmailMessage, Mailer, verification_email, welcome_email};
use crate::state::AppState;

/// Registration input after schema validation.
#[derive(Debug, Clone)]
pub struct Registration<'a> {
    pub email: Email,
    pub password: &'a str,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub phone: Option<&'a str>,
}

/// Authentication service.
///
/// Handles registration, email verification, login, and access token
/// issuance and revocation.
pub struct AuthService<'a> {
    state: &'a AppState,
    users: UserRepository<'a>,
    verification: VerificationTokenRepository<'a>,
    revoked: RevokedTokenRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub fn new(state: &'a AppState) -> Self {
        let pool = state.pool();
        Self {
            state,
            users: UserRepository::new(pool),
            verification: VerificationTokenRepository::new(pool),
            revoked: RevokedTokenRepository::new(pool),
        }
    }

    // =========================================================================
    // Registration & Verification
    // =========================================================================

    /// Register a new, unverified user and email them a verification link.
    ///
    /// A failed email is logged; the account still exists and the user can
    /// ask for a new link.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(&self, registration: &Registration<'_>) -> Result<User, AuthError> {
        let hashed_password = hash_password(registration.password)?;
        let token = Uuid::new_v4();
        let expires_at = Utc::now() + self.verification_ttl();

        let user = self
            .users
            .create_unverified(
                &NewUser {
                    email: &registration.email,
                    hashed_password: &hashed_password,
                    first_name: registration.first_name,
                    last_name: registration.last_name,
                    phone: registration.phone,
                },
                token,
                expires_at,
            )
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "User registered");
        self.send_verification(&user, token).await;

        Ok(user)
    }

    /// Redeem a verification token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidVerificationToken` if the token is unknown
    /// or already used, and `AuthError::VerificationTokenExpired` (after
    /// deleting it) if it is past its expiry.
    pub async fn verify_email(&self, token: &str) -> Result<User, AuthError> {
        let token = parse_verification_token(token)?;

        let record = self
            .verification
            .find(token)
            .await?
            .ok_or(AuthError::InvalidVerificationToken)?;

        if let Err(e) = ensure_not_expired(&record, Utc::now()) {
            self.verification.delete(token).await?;
            return Err(e);
        }

        let user = self
            .verification
            .redeem(token)
            .await?
            .ok_or(AuthError::InvalidVerificationToken)?;

        tracing::info!(user_id = %user.id, "Email verified");

        let message = welcome_email(self.branding(), user.email.as_str(), user.greeting_name());
        if let Err(e) = self.state.mailer().send(&message).await {
            tracing::warn!(user_id = %user.id, error = %e, "Failed to send welcome email");
        }

        Ok(user)
    }

    /// Issue a fresh verification link if `email` belongs to an unverified
    /// account.
    ///
    /// Never reports whether the account exists; failures are only logged.
    pub async fn resend_verification(&self, email: &Email) {
        if let Err(e) = self.try_resend_verification(email).await {
            let event_id = sentry::capture_error(&e);
            tracing::error!(
                error = %e,
                sentry_event_id = %event_id,
                "Failed to resend verification email"
            );
        }
    }

    async fn try_resend_verification(&self, email: &Email) -> Result<(), AuthError> {
        let Some(user) = self.users.get_by_email(email).await? else {
            tracing::debug!("Verification resend requested for unknown email");
            return Ok(());
        };

        if user.is_verified {
            tracing::debug!(user_id = %user.id, "Verification resend requested for verified user");
            return Ok(());
        }

        let token = Uuid::new_v4();
        let expires_at = Utc::now() + self.verification_ttl();
        self.verification
            .replace_for_user(user.id, token, expires_at)
            .await?;

        // The response never waits on delivery
        let message = self.verification_message(&user, token);
        let state = self.state.clone();
        let user_id = user.id;
        tokio::spawn(async move {
            deliver_verification(state.mailer(), user_id, &message).await;
        });
        Ok(())
    }

    async fn send_verification(&self, user: &User, token: Uuid) {
        let message = self.verification_message(user, token);
        deliver_verification(self.state.mailer(), user.id, &message).await;
    }

    fn verification_message(&self, user: &User, token: Uuid) -> EmailMessage {
        verification_email(
            self.branding(),
            user.email.as_str(),
            user.greeting_name(),
            token,
            self.state.config().verification_token_ttl_hours,
        )
    }

    // =========================================================================
    // Login & Tokens
    // =========================================================================

    /// Check credentials and issue an access token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email or wrong
    /// password, `AuthError::InactiveUser` for a disabled account and
    /// `AuthError::EmailNotVerified` until the email is verified.
    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedToken, AuthError> {
        let Ok(email) = Email::parse(email) else {
            return reject_unknown_account(password);
        };

        let Some(user) = self.users.get_by_email(&email).await? else {
            return reject_unknown_account(password);
        };

        verify_password(password, &user.hashed_password)?;
        ensure_can_login(&user)?;

        let issued = self.state.jwt().issue(user.id, Utc::now())?;
        tracing::info!(user_id = %user.id, "User logged in");

        Ok(issued)
    }

    /// Resolve a bearer token to its active user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` or `AuthError::TokenRevoked` for an
    /// unusable token, `AuthError::UserNotFound` if the user is gone and
    /// `AuthError::InactiveUser` if the account is disabled.
    pub async fn authenticate(&self, token: &str) -> Result<(User, Claims), AuthError> {
        let claims = self.state.jwt().verify(token)?;

        if self.is_revoked(claims.jti).await? {
            return Err(AuthError::TokenRevoked);
        }

        let user = self
            .users
            .get_by_id(claims.user_id()?)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !user.is_active {
            return Err(AuthError::InactiveUser);
        }

        Ok((user, claims))
    }

    /// Issue a new token and revoke the one presented.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if signing or the revocation write fails.
    pub async fn refresh(&self, user: &User, presented: &Claims) -> Result<IssuedToken, AuthError> {
        let issued = self.state.jwt().issue(user.id, Utc::now())?;
        self.revoke(user, presented).await?;
        Ok(issued)
    }

    /// Revoke a token until its natural expiry.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the revocation cannot be stored.
    pub async fn revoke(&self, user: &User, claims: &Claims) -> Result<(), AuthError> {
        self.revoked
            .revoke(claims.jti, user.id, claims.expires_at())
            .await?;
        self.state.revoked_tokens().insert(claims.jti, ()).await;
        tracing::info!(user_id = %user.id, "Access token revoked");
        Ok(())
    }

    async fn is_revoked(&self, jti: Uuid) -> Result<bool, AuthError> {
        let cache = self.state.revoked_tokens();
        if cache.get(&jti).await.is_some() {
            return Ok(true);
        }

        let revoked = self.revoked.is_revoked(jti).await?;
        if revoked {
            cache.insert(jti, ()).await;
        }
        Ok(revoked)
    }

    fn verification_ttl(&self) -> Duration {
        Duration::hours(self.state.config().verification_token_ttl_hours)
    }

    fn branding(&self) -> Branding<'_> {
        let config = self.state.config();
        Branding {
            shop_name: &config.email.from_name,
            frontend_url: &config.frontend_url,
        }
    }
}

async fn deliver_verification(mailer: &Mailer, user_id: UserId, message: &EmailMessage) {
    if let Err(e) = mailer.send(message).await {
        let event_id = sentry::capture_error(&e);
        tracing::error!(
            user_id = %user_id,
            error = %e,
            sentry_event_id = %event_id,
            "Failed to send verification email"
        );
    }
}

/// Parse the token from a verification link. Anything that is not a UUID
/// cannot match a stored token.
///
/// # Errors
///
/// Returns `AuthError::InvalidVerificationToken` for malformed input.
pub fn parse_verification_token(raw: &str) -> Result<Uuid, AuthError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AuthError::InvalidVerificationToken)
}

/// Account checks applied after the password matches.
///
/// # Errors
///
/// Returns `AuthError::InactiveUser` or `AuthError::EmailNotVerified`.
pub fn ensure_can_login(user: &User) -> Result<(), AuthError> {
    if !user.is_active {
        return Err(AuthError::InactiveUser);
    }
    if !user.is_verified {
        return Err(AuthError::EmailNotVerified);
    }
    Ok(())
}

/// Reject a verification token that is past its expiry.
///
/// # Errors
///
/// Returns `AuthError::VerificationTokenExpired`.
pub fn ensure_not_expired(token: &VerificationToken, now: DateTime<Utc>) -> Result<(), AuthError> {
    if token.is_expired_at(now) {
        return Err(AuthError::VerificationTokenExpired);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use emporium_core::{UserId, VerificationTokenId};

    use super::*;
    use crate::models::user::fixtures::customer;

    #[test]
    fn test_unverified_user_cannot_log_in() {
        let mut user = customer(1, "ada@example.com");
        user.is_verified = false;
        assert!(matches!(
            ensure_can_login(&user),
            Err(AuthError::EmailNotVerified)
        ));

        user.is_verified = true;
        assert!(ensure_can_login(&user).is_ok());
    }

    #[test]
    fn test_malformed_verification_token_is_invalid() {
        assert!(matches!(
            parse_verification_token("abc123-truncated"),
            Err(AuthError::InvalidVerificationToken)
        ));
        let token = Uuid::new_v4();
        assert_eq!(
            parse_verification_token(&format!(" {token} ")).unwrap(),
            token
        );
    }

    #[test]
    fn test_inactive_takes_precedence_over_unverified() {
        let mut user = customer(1, "ada@example.com");
        user.is_active = false;
        user.is_verified = false;
        assert!(matches!(
            ensure_can_login(&user),
            Err(AuthError::InactiveUser)
        ));
    }

    #[test]
    fn test_token_older_than_lifetime_is_rejected() {
        let issued = Utc::now() - Duration::hours(25);
        let token = VerificationToken {
            id: VerificationTokenId::new(1),
            token: Uuid::new_v4(),
            user_id: UserId::new(1),
            expires_at: issued + Duration::hours(24),
            created_at: issued,
        };
        assert!(matches!(
            ensure_not_expired(&token, Utc::now()),
            Err(AuthError::VerificationTokenExpired)
        ));
        assert!(ensure_not_expired(&token, issued + Duration::hours(23)).is_ok());
    }
}
