//! Request and response payloads.
//!
//! Request bodies derive `Deserialize` + `Validate` and are pulled out of
//! requests with [`ValidatedJson`] / [`ValidatedQuery`]; validation failures
//! become a 422 with per-field messages. Path parameters go through
//! [`ApiPath`] so a malformed id gets the same JSON error body.

pub mod auth;
pub mod category;
pub mod order;
pub mod product;
pub mod user;

use std::borrow::Cow;

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
};
use rust_decimal::Decimal;
use serde::{Serialize, de::DeserializeOwned};
use validator::{Validate, ValidationError};

use emporium_core::Pagination;

use crate::error::AppError;
use crate::services::auth::check_password_policy;

// =============================================================================
// Extractors
// =============================================================================

/// JSON body that has passed `validator` checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::Unprocessable(e.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Query string that has passed `validator` checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::Unprocessable(e.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Path parameters whose rejection is a JSON [`AppError`] rather than
/// axum's plain-text 400.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::Unprocessable(e.body_text()))?;
        Ok(Self(value))
    }
}

// =============================================================================
// Shared responses
// =============================================================================

/// One page of a listing.
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub pages: i64,
}

impl<T> ListResponse<T> {
    /// Build a page from already converted items.
    #[must_use]
    pub const fn new(items: Vec<T>, total: i64, page: Pagination) -> Self {
        Self {
            items,
            total,
            page: page.page,
            page_size: page.page_size,
            pages: page.page_count(total),
        }
    }
}

/// Plain `{"message": ...}` body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// =============================================================================
// Custom validators
// =============================================================================

pub(crate) fn validate_password(password: &str) -> Result<(), ValidationError> {
    check_password_policy(password)
        .map_err(|msg| ValidationError::new("password_policy").with_message(Cow::Borrowed(msg)))
}

pub(crate) fn validate_positive_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price <= Decimal::ZERO {
        return Err(ValidationError::new("range")
            .with_message(Cow::Borrowed("Price must be greater than 0")));
    }
    if price.scale() > 2 {
        return Err(ValidationError::new("precision")
            .with_message(Cow::Borrowed("Price must have at most 2 decimal places")));
    }
    Ok(())
}

pub(crate) fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    let well_formed = !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if well_formed {
        Ok(())
    } else {
        Err(ValidationError::new("slug").with_message(Cow::Borrowed(
            "Slug may only contain lowercase letters, digits and hyphens",
        )))
    }
}

pub(crate) fn default_page() -> u32 {
    1
}

pub(crate) fn default_page_size() -> u32 {
    20
}

pub(crate) fn default_true() -> Option<bool> {
    Some(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_response_counts_pages() {
        let page = Pagination::new(2, 20, 100);
        let list = ListResponse::new(vec![1, 2, 3], 43, page);
        assert_eq!(list.pages, 3);
        assert_eq!(list.page, 2);
        assert_eq!(list.page_size, 20);
    }

    #[test]
    fn test_positive_price() {
        assert!(validate_positive_price(&Decimal::new(1999, 2)).is_ok());
        assert!(validate_positive_price(&Decimal::ZERO).is_err());
        assert!(validate_positive_price(&Decimal::new(-1, 0)).is_err());
        assert!(validate_positive_price(&Decimal::new(10001, 3)).is_err());
    }

    #[test]
    fn test_slug_shape() {
        assert!(validate_slug("coffee-mugs-2").is_ok());
        assert!(validate_slug("Coffee").is_err());
        assert!(validate_slug("-mugs").is_err());
        assert!(validate_slug("mugs and cups").is_err());
    }
}
