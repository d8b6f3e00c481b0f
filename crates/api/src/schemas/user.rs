//! Profile payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use emporium_core::{Email, UserId, UserRole};

use crate::models::{CompanyDetails, ProfileChanges, ShippingAddress, User};

/// A user as returned to clients. Never carries the password hash.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub email: Email,
    pub is_active: bool,
    pub is_verified: bool,
    pub role: UserRole,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub shipping_street: Option<String>,
    pub shipping_city: Option<String>,
    pub shipping_postal_code: Option<String>,
    pub shipping_country: Option<String>,
    pub shipping_state: Option<String>,
    pub company_name: Option<String>,
    pub company_tax_id: Option<String>,
    pub company_address_street: Option<String>,
    pub company_address_city: Option<String>,
    pub company_address_postal_code: Option<String>,
    pub company_address_country: Option<String>,
    pub company_address_state: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let ShippingAddress {
            shipping_street,
            shipping_city,
            shipping_postal_code,
            shipping_country,
            shipping_state,
        } = user.shipping;
        let CompanyDetails {
            company_name,
            company_tax_id,
            company_address_street,
            company_address_city,
            company_address_postal_code,
            company_address_country,
            company_address_state,
        } = user.company;

        Self {
            id: user.id,
            email: user.email,
            is_active: user.is_active,
            is_verified: user.is_verified,
            role: user.role,
            first_name: user.first_name,
            last_name: user.last_name,
            phone: user.phone,
            shipping_street,
            shipping_city,
            shipping_postal_code,
            shipping_country,
            shipping_state,
            company_name,
            company_tax_id,
            company_address_street,
            company_address_city,
            company_address_postal_code,
            company_address_country,
            company_address_state,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// `PUT /auth/me` body. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UserUpdate {
    #[validate(length(max = 100))]
    pub first_name: Option<String>,
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,

    #[validate(length(max = 255))]
    pub shipping_street: Option<String>,
    #[validate(length(max = 100))]
    pub shipping_city: Option<String>,
    #[validate(length(max = 20))]
    pub shipping_postal_code: Option<String>,
    #[validate(length(max = 100))]
    pub shipping_country: Option<String>,
    #[validate(length(max = 100))]
    pub shipping_state: Option<String>,

    #[validate(length(max = 255))]
    pub company_name: Option<String>,
    #[validate(length(max = 50))]
    pub company_tax_id: Option<String>,
    #[validate(length(max = 255))]
    pub company_address_street: Option<String>,
    #[validate(length(max = 100))]
    pub company_address_city: Option<String>,
    #[validate(length(max = 20))]
    pub company_address_postal_code: Option<String>,
    #[validate(length(max = 100))]
    pub company_address_country: Option<String>,
    #[validate(length(max = 100))]
    pub company_address_state: Option<String>,
}

impl From<UserUpdate> for ProfileChanges {
    fn from(update: UserUpdate) -> Self {
        Self {
            first_name: update.first_name,
            last_name: update.last_name,
            phone: update.phone,
            shipping: ShippingAddress {
                shipping_street: update.shipping_street,
                shipping_city: update.shipping_city,
                shipping_postal_code: update.shipping_postal_code,
                shipping_country: update.shipping_country,
                shipping_state: update.shipping_state,
            },
            company: CompanyDetails {
                company_name: update.company_name,
                company_tax_id: update.company_tax_id,
                company_address_street: update.company_address_street,
                company_address_city: update.company_address_city,
                company_address_postal_code: update.company_address_postal_code,
                company_address_country: update.company_address_country,
                company_address_state: update.company_address_state,
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::user::fixtures::customer;

    #[test]
    fn test_response_omits_password_hash() {
        let mut user = customer(7, "ada@example.com");
        user.hashed_password = "$argon2id$v=19$secret".to_owned();
        let json = serde_json::to_value(UserResponse::from(user)).unwrap();

        assert_eq!(json["id"], 7);
        assert_eq!(json["email"], "ada@example.com");
        assert_eq!(json["role"], "customer");
        assert!(json.get("hashed_password").is_none());
    }

    #[test]
    fn test_update_maps_to_profile_changes() {
        let update: UserUpdate =
            serde_json::from_str(r#"{"first_name":"Ada","shipping_city":"Krakow"}"#).unwrap();
        assert!(update.validate().is_ok());

        let changes = ProfileChanges::from(update);
        assert_eq!(changes.first_name.as_deref(), Some("Ada"));
        assert_eq!(changes.shipping.shipping_city.as_deref(), Some("Krakow"));
        assert!(changes.company.company_name.is_none());
    }
}
