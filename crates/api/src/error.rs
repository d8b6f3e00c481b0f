//! Unified error handling with Sentry integration.
//!
//! All route handlers return `Result<T, AppError>`. Server-side failures are
//! captured to Sentry before the response is built; clients only ever see a
//! `{"detail": ...}` body.

use std::collections::BTreeMap;

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::orders::OrderError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Order placement or update was rejected.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Request body failed schema validation.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Request body could not be parsed.
    #[error("Unprocessable entity: {0}")]
    Unprocessable(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or unusable credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<BTreeMap<String, Vec<String>>>,
}

impl AppError {
    /// Whether the failure is on our side and should be reported.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        match self {
            Self::Database(e) => !matches!(e, RepositoryError::Conflict(_) | RepositoryError::NotFound),
            Self::Auth(e) => e.is_internal(),
            Self::Order(e) => matches!(e, OrderError::Repository(_)),
            Self::Internal(_) => true,
            _ => false,
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Database(e) => match e {
                RepositoryError::Conflict(_) => StatusCode::BAD_REQUEST,
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Auth(e) => match e {
                AuthError::InvalidCredentials
                | AuthError::InvalidToken
                | AuthError::TokenRevoked
                | AuthError::UserNotFound => StatusCode::UNAUTHORIZED,
                AuthError::EmailNotVerified => StatusCode::FORBIDDEN,
                AuthError::InactiveUser
                | AuthError::UserAlreadyExists
                | AuthError::InvalidVerificationToken
                | AuthError::VerificationTokenExpired => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::Token(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Order(e) => match e {
                OrderError::NotFound => StatusCode::NOT_FOUND,
                OrderError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_REQUEST,
            },
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) | Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Client-facing message. Internal details are never exposed.
    #[must_use]
    pub fn detail(&self) -> String {
        if self.is_server_error() {
            return "Internal server error".to_owned();
        }

        match self {
            Self::Database(RepositoryError::Conflict(msg)) => msg.clone(),
            Self::Database(_) => "Not found".to_owned(),
            Self::Auth(e) => match e {
                AuthError::InvalidCredentials => "Incorrect email or password",
                AuthError::InactiveUser => "Inactive user",
                AuthError::EmailNotVerified => "Email not verified",
                AuthError::UserAlreadyExists => "User with this email already exists",
                AuthError::InvalidVerificationToken => "Invalid verification token",
                AuthError::VerificationTokenExpired => "Verification token has expired",
                _ => "Could not validate credentials",
            }
            .to_owned(),
            Self::Order(e) => e.to_string(),
            Self::Validation(_) => "Validation failed".to_owned(),
            Self::Unprocessable(msg)
            | Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::BadRequest(msg)
            | Self::Internal(msg) => msg.clone(),
        }
    }

    fn field_errors(&self) -> Option<BTreeMap<String, Vec<String>>> {
        let Self::Validation(errors) = self else {
            return None;
        };
        let mut fields = BTreeMap::new();
        collect_messages(errors, None, &mut fields);
        Some(fields)
    }

    fn wants_bearer_challenge(&self) -> bool {
        self.status() == StatusCode::UNAUTHORIZED
    }
}

/// Flatten nested validation errors into `field`, `items[0].quantity` keys.
fn collect_messages(
    errors: &ValidationErrors,
    prefix: Option<&str>,
    out: &mut BTreeMap<String, Vec<String>>,
) {
    for (field, kind) in errors.errors() {
        let key = prefix.map_or_else(|| field.to_string(), |p| format!("{p}.{field}"));
        match kind {
            ValidationErrorsKind::Field(errs) => {
                out.entry(key).or_default().extend(errs.iter().map(|e| {
                    e.message
                        .as_ref()
                        .map_or_else(|| e.code.to_string(), ToString::to_string)
                }));
            }
            ValidationErrorsKind::Struct(inner) => collect_messages(inner, Some(&key), out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_messages(inner, Some(&format!("{key}[{index}]")), out);
                }
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let body = ErrorBody {
            detail: self.detail(),
            errors: self.field_errors(),
        };

        let mut response = (status, Json(body)).into_response();
        if self.wants_bearer_challenge() {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the authenticated user.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;
    use emporium_core::OrderStatus;
    use validator::Validate;

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    async fn body_json(err: AppError) -> serde_json::Value {
        let response = err.into_response();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(RepositoryError::Conflict("dup".to_string()).into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_auth_error_status_codes() {
        assert_eq!(
            get_status(AuthError::InvalidCredentials.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AuthError::EmailNotVerified.into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AuthError::InactiveUser.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AuthError::VerificationTokenExpired.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AuthError::TokenRevoked.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AuthError::PasswordHash.into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_order_error_status_codes() {
        assert_eq!(get_status(OrderError::NotFound.into()), StatusCode::NOT_FOUND);
        assert_eq!(
            get_status(
                OrderError::InvalidTransition {
                    from: OrderStatus::Shipped,
                    to: OrderStatus::Cancelled,
                }
                .into()
            ),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_unauthorized_carries_bearer_challenge() {
        let response = AppError::from(AuthError::InvalidCredentials).into_response();
        assert_eq!(
            response.headers().get(WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );

        let body = body_json(AuthError::InvalidCredentials.into()).await;
        assert_eq!(body["detail"], "Incorrect email or password");
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let body = body_json(AppError::Internal("pool exhausted".to_string())).await;
        assert_eq!(body["detail"], "Internal server error");
        assert!(body.get("errors").is_none());
    }

    #[tokio::test]
    async fn test_validation_errors_are_listed_per_field() {
        #[derive(Validate)]
        struct Probe {
            #[validate(length(min = 3, message = "Too short"))]
            name: String,
        }

        let errors = Probe {
            name: "ab".to_string(),
        }
        .validate()
        .unwrap_err();

        let err = AppError::from(errors);
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(err).await;
        assert_eq!(body["detail"], "Validation failed");
        assert_eq!(body["errors"]["name"][0], "Too short");
    }
}
