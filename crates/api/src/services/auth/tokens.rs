//! JWT access tokens.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use emporium_core::UserId;

use super::AuthError;
use crate::config::{JwtConfig, jwt_secret_bytes};

/// Access token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    pub sub: String,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
    /// Issued at, seconds since the epoch.
    pub iat: i64,
    /// Token ID, used for revocation.
    pub jti: Uuid,
}

impl Claims {
    /// The user the token was issued to.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if `sub` is not a user ID.
    pub fn user_id(&self) -> Result<UserId, AuthError> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken)
    }

    /// When the token stops being accepted.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// A freshly signed token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
    /// Lifetime in seconds.
    pub expires_in: i64,
}

/// Signing and verification keys for access tokens.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    header: Header,
    validation: Validation,
    ttl: Duration,
}

impl JwtKeys {
    /// Build keys from configuration.
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        let secret = jwt_secret_bytes(config);
        let mut validation = Validation::new(config.algorithm);
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            header: Header::new(config.algorithm),
            validation,
            ttl: Duration::minutes(config.access_token_ttl_minutes),
        }
    }

    /// Token lifetime.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a new token for `user_id`, valid from `now`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` if signing fails.
    pub fn issue(&self, user_id: UserId, now: DateTime<Utc>) -> Result<IssuedToken, AuthError> {
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            jti: Uuid::new_v4(),
        };
        let token = encode(&self.header, &claims, &self.encoding)?;

        Ok(IssuedToken {
            token,
            claims,
            expires_in: self.ttl.num_seconds(),
        })
    }

    /// Verify a token's signature, algorithm and expiry.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for any malformed, tampered,
    /// expired or foreign token.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected access token");
                AuthError::InvalidToken
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use jsonwebtoken::Algorithm;
    use secrecy::SecretString;

    use super::*;

    fn keys(secret: &str, algorithm: Algorithm) -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: SecretString::from(secret.to_owned()),
            algorithm,
            access_token_ttl_minutes: 30,
        })
    }

    const SECRET: &str = "q8Zr2vLx9Tn4Wk7Bc1Hm5Pd3Fs6Gj0Ye";

    #[test]
    fn test_round_trip() {
        let keys = keys(SECRET, Algorithm::HS256);
        let issued = keys.issue(UserId::new(42), Utc::now()).unwrap();

        assert_eq!(issued.expires_in, 1800);
        let claims = keys.verify(&issued.token).unwrap();
        assert_eq!(claims, issued.claims);
        assert_eq!(claims.user_id().unwrap(), UserId::new(42));
        assert_eq!(claims.exp - claims.iat, 1800);
    }

    #[test]
    fn test_each_token_has_unique_jti() {
        let keys = keys(SECRET, Algorithm::HS256);
        let now = Utc::now();
        let a = keys.issue(UserId::new(1), now).unwrap();
        let b = keys.issue(UserId::new(1), now).unwrap();
        assert_ne!(a.claims.jti, b.claims.jti);
    }

    #[test]
    fn test_expired_token_rejected() {
        let keys = keys(SECRET, Algorithm::HS256);
        let issued = keys
            .issue(UserId::new(1), Utc::now() - Duration::hours(2))
            .unwrap();
        assert!(matches!(
            keys.verify(&issued.token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issued = keys(SECRET, Algorithm::HS256)
            .issue(UserId::new(1), Utc::now())
            .unwrap();
        let other = keys("Zm9vYmFyYmF6cXV4MTIzNDU2Nzg5MGFi", Algorithm::HS256);
        assert!(other.verify(&issued.token).is_err());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let keys = keys(SECRET, Algorithm::HS256);
        let issued = keys.issue(UserId::new(1), Utc::now()).unwrap();

        let forged_claims = Claims {
            sub: "2".to_owned(),
            ..issued.claims.clone()
        };
        let forged = encode(
            &Header::new(Algorithm::HS256),
            &forged_claims,
            &EncodingKey::from_secret(b"attacker"),
        )
        .unwrap();
        let forged_payload = forged.split('.').nth(1).unwrap();

        let mut parts: Vec<&str> = issued.token.split('.').collect();
        parts[1] = forged_payload;

        assert!(keys.verify(&parts.join(".")).is_err());
    }

    #[test]
    fn test_algorithm_mismatch_rejected() {
        let issued = keys(SECRET, Algorithm::HS512)
            .issue(UserId::new(1), Utc::now())
            .unwrap();
        assert!(keys(SECRET, Algorithm::HS256).verify(&issued.token).is_err());
    }

    #[test]
    fn test_non_numeric_subject() {
        let claims = Claims {
            sub: "admin".to_owned(),
            exp: 0,
            iat: 0,
            jti: Uuid::nil(),
        };
        assert!(matches!(claims.user_id(), Err(AuthError::InvalidToken)));
    }
}
