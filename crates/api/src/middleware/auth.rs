//! Bearer token extractors.
//!
//! `AuthUser` resolves the `Authorization: Bearer <jwt>` header to an active
//! user. `RequireAdmin` additionally requires the admin role.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::Span;

use crate::error::{AppError, set_sentry_user};
use crate::models::User;
use crate::services::auth::{AuthService, Claims};
use crate::state::AppState;

/// Extractor for an authenticated, active user.
///
/// # Example
///
/// ```rust,ignore
/// async fn me(AuthUser { user, .. }: AuthUser) -> Json<UserResponse> {
///     Json(user.into())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    /// Claims of the presented token, needed to revoke it.
    pub claims: Claims,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_owned()))?;

        let (user, claims) = AuthService::new(state).authenticate(token).await?;

        Span::current().record("user_id", user.id.as_i32());
        set_sentry_user(&user.id, Some(user.email.as_str()));

        Ok(Self { user, claims })
    }
}

/// Extractor for an authenticated admin.
///
/// Rejects other users with 403 "Not enough permissions".
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub User);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser { user, .. } = AuthUser::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            tracing::warn!(user_id = %user.id, path = %parts.uri.path(), "Admin route denied");
            return Err(AppError::Forbidden("Not enough permissions".to_owned()));
        }

        Ok(Self(user))
    }
}

/// Token from an `Authorization: Bearer` header. The scheme is case-insensitive.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
