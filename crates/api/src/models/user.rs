//! User domain types.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use emporium_core::{Email, UserId, UserRole, VerificationTokenId};

/// A shop account as stored in `users`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    /// Argon2id PHC string.
    pub hashed_password: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    #[sqlx(flatten)]
    pub shipping: ShippingAddress,
    #[sqlx(flatten)]
    pub company: CompanyDetails,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether the user may call admin-only endpoints.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// First name if set, otherwise the local part of the email.
    #[must_use]
    pub fn greeting_name(&self) -> &str {
        self.first_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.email.local_part())
    }
}

/// Default shipping address saved on the profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct ShippingAddress {
    pub shipping_street: Option<String>,
    pub shipping_city: Option<String>,
    pub shipping_postal_code: Option<String>,
    pub shipping_country: Option<String>,
    pub shipping_state: Option<String>,
}

/// Company data printed on invoices.
#[derive(Debug, Clone, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct CompanyDetails {
    pub company_name: Option<String>,
    pub company_tax_id: Option<String>,
    pub company_address_street: Option<String>,
    pub company_address_city: Option<String>,
    pub company_address_postal_code: Option<String>,
    pub company_address_country: Option<String>,
    pub company_address_state: Option<String>,
}

/// Profile fields a user may change on themselves.
///
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub shipping: ShippingAddress,
    pub company: CompanyDetails,
}

/// A pending email verification.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VerificationToken {
    pub id: VerificationTokenId,
    pub token: Uuid,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl VerificationToken {
    /// Whether the token can no longer be used at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// A verified customer with no profile data.
    pub fn customer(id: i32, email: &str) -> User {
        User {
            id: UserId::new(id),
            email: Email::parse(email).unwrap_or_else(|e| panic!("bad fixture email: {e}")),
            hashed_password: String::new(),
            is_active: true,
            is_verified: true,
            first_name: None,
            last_name: None,
            phone: None,
            shipping: ShippingAddress::default(),
            company: CompanyDetails::default(),
            role: UserRole::Customer,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
