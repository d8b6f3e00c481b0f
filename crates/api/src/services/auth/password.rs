//! Password policy and Argon2id hashing.

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use super::AuthError;

/// Minimum password length in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length in characters.
pub const MAX_PASSWORD_LENGTH: usize = 100;

/// Check a new password against the policy: 8 to 100 characters with at
/// least one digit and one uppercase letter.
///
/// # Errors
///
/// Returns a message describing the first rule the password breaks.
pub fn check_password_policy(password: &str) -> Result<(), &'static str> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err("Password must be at least 8 characters");
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err("Password must be at most 100 characters");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one digit");
    }
    if !password.chars().any(char::is_uppercase) {
        return Err("Password must contain at least one uppercase letter");
    }
    Ok(())
}

/// Hash a password using Argon2id with the OWASP default parameters.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored PHC hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` if the password does not match
/// or the stored hash cannot be parsed.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Hash checked when login names an account that does not exist.
static UNKNOWN_ACCOUNT_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("Unknown-account-0").ok());

/// Fail a login for an account that does not exist, after spending the
/// same Argon2 work a real password check costs.
///
/// # Errors
///
/// Always returns `AuthError::InvalidCredentials`.
pub fn reject_unknown_account<T>(password: &str) -> Result<T, AuthError> {
    if let Some(hash) = UNKNOWN_ACCOUNT_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
    Err(AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_accepts_strong_password() {
        assert!(check_password_policy("Correct1horse").is_ok());
    }

    #[test]
    fn test_policy_length_bounds() {
        assert!(check_password_policy("Abc1234").is_err());
        assert!(check_password_policy("Abc12345").is_ok());

        let long = format!("A1{}", "x".repeat(98));
        assert_eq!(long.chars().count(), 100);
        assert!(check_password_policy(&long).is_ok());
        assert!(check_password_policy(&format!("{long}x")).is_err());
    }

    #[test]
    fn test_policy_requires_digit_and_uppercase() {
        assert_eq!(
            check_password_policy("NoDigitsHere"),
            Err("Password must contain at least one digit")
        );
        assert_eq!(
            check_password_policy("lowercase123"),
            Err("Password must contain at least one uppercase letter")
        );
    }

    #[test]
    fn test_hash_is_argon2id_and_verifies() {
        let hash = hash_password("Correct1horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("Correct1horse", &hash).is_ok());
        assert!(matches!(
            verify_password("Wrong1horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("Correct1horse").unwrap();
        let b = hash_password("Correct1horse").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_garbage_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_unknown_account_is_always_rejected() {
        for password in ["Unknown-account-0", "Correct1horse", ""] {
            assert!(matches!(
                reject_unknown_account::<()>(password),
                Err(AuthError::InvalidCredentials)
            ));
        }
        assert!(UNKNOWN_ACCOUNT_HASH.is_some());
    }
}
