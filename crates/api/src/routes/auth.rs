//! Account routes: registration, email verification, tokens and profile.

use axum::{Json, extract::State, http::StatusCode};

use emporium_core::Email;

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::ProfileChanges;
use crate::schemas::auth::{
    LoginRequest, RegisterRequest, ResendVerificationRequest, TokenResponse, VerifyEmailRequest,
};
use crate::schemas::user::{UserResponse, UserUpdate};
use crate::schemas::{MessageResponse, ValidatedJson};
use crate::services::auth::{AuthService, Registration};
use crate::state::AppState;

/// Response to every resend request, whether or not the account exists.
pub const RESEND_VERIFICATION_MESSAGE: &str =
    "If an unverified account exists for this email, a new verification link has been sent";

/// Create an unverified account and email a verification link.
///
/// POST /api/v1/auth/register
///
/// # Errors
///
/// 400 if the email is already registered, 422 for invalid input.
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let email = Email::parse(&req.email).map_err(|e| AppError::Unprocessable(e.to_string()))?;

    let user = AuthService::new(&state)
        .register(&Registration {
            email,
            password: &req.password,
            first_name: req.first_name.as_deref(),
            last_name: req.last_name.as_deref(),
            phone: req.phone.as_deref(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Exchange credentials for an access token.
///
/// POST /api/v1/auth/login
///
/// # Errors
///
/// 401 for wrong credentials, 400 for an inactive account and 403 until
/// the email is verified.
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<TokenResponse>> {
    let issued = AuthService::new(&state)
        .login(&req.email, &req.password)
        .await?;
    Ok(Json(issued.into()))
}

/// Redeem a verification token.
///
/// POST /api/v1/auth/verify-email
///
/// # Errors
///
/// 400 if the token is unknown, already used or expired.
pub async fn verify_email(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<VerifyEmailRequest>,
) -> Result<Json<MessageResponse>> {
    AuthService::new(&state).verify_email(&req.token).await?;
    Ok(Json(MessageResponse::new("Email verified successfully")))
}

/// Send a fresh verification link.
///
/// POST /api/v1/auth/resend-verification
///
/// Always answers with the same message so the endpoint cannot be used to
/// probe for registered emails.
///
/// # Errors
///
/// 422 only when the body itself is malformed.
pub async fn resend_verification(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ResendVerificationRequest>,
) -> Result<Json<MessageResponse>> {
    if let Ok(email) = Email::parse(&req.email) {
        AuthService::new(&state).resend_verification(&email).await;
    }
    Ok(Json(MessageResponse::new(RESEND_VERIFICATION_MESSAGE)))
}

/// Rotate the presented token.
///
/// POST /api/v1/auth/refresh
///
/// # Errors
///
/// 401 without a valid token.
pub async fn refresh(
    State(state): State<AppState>,
    AuthUser { user, claims }: AuthUser,
) -> Result<Json<TokenResponse>> {
    let issued = AuthService::new(&state).refresh(&user, &claims).await?;
    Ok(Json(issued.into()))
}

/// Revoke the presented token.
///
/// POST /api/v1/auth/logout
///
/// # Errors
///
/// 401 without a valid token.
pub async fn logout(
    State(state): State<AppState>,
    AuthUser { user, claims }: AuthUser,
) -> Result<StatusCode> {
    AuthService::new(&state).revoke(&user, &claims).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Current user's profile.
///
/// GET /api/v1/auth/me
pub async fn me(AuthUser { user, .. }: AuthUser) -> Json<UserResponse> {
    Json(user.into())
}

/// Update the current user's profile.
///
/// PUT /api/v1/auth/me
///
/// # Errors
///
/// 422 for invalid input.
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    ValidatedJson(req): ValidatedJson<UserUpdate>,
) -> Result<Json<UserResponse>> {
    let changes = ProfileChanges::from(req);
    let updated = UserRepository::new(state.pool())
        .update_profile(user.id, &changes)
        .await?;

    tracing::info!(user_id = %updated.id, "Profile updated");
    Ok(Json(updated.into()))
}
