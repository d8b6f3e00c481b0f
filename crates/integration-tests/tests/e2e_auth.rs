//! End-to-end tests for registration and email verification.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`emporium-cli migrate`)
//! - The API server running (`cargo run -p emporium-api`) with
//!   `RATE_LIMIT_ENABLED=false`
//! - `DATABASE_URL` pointing at the same database, to read tokens
//!
//! Run with: cargo test -p emporium-integration-tests -- --ignored

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

use emporium_integration_tests::{api_base_url, e2e_pool, unique_email};

const PASSWORD: &str = "Sup3rSecret";

async fn register(client: &Client, email: &str) -> reqwest::Response {
    client
        .post(format!("{}/api/v1/auth/register", api_base_url()))
        .json(&json!({"email": email, "password": PASSWORD, "first_name": "Test"}))
        .send()
        .await
        .expect("Failed to register")
}

async fn login(client: &Client, email: &str) -> reqwest::Response {
    client
        .post(format!("{}/api/v1/auth/login", api_base_url()))
        .json(&json!({"email": email, "password": PASSWORD}))
        .send()
        .await
        .expect("Failed to log in")
}

async fn verify(client: &Client, token: Uuid) -> reqwest::Response {
    client
        .post(format!("{}/api/v1/auth/verify-email", api_base_url()))
        .json(&json!({"token": token}))
        .send()
        .await
        .expect("Failed to verify")
}

async fn latest_token(pool: &PgPool, email: &str) -> Option<Uuid> {
    sqlx::query_scalar(
        r"
        SELECT vt.token FROM verification_tokens vt
        JOIN users u ON u.id = vt.user_id
        WHERE u.email = $1
        ORDER BY vt.created_at DESC
        LIMIT 1
        ",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .expect("Failed to read verification token")
}

// ============================================================================
// Verification flow
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_login_blocked_until_verified() {
    let client = Client::new();
    let pool = e2e_pool().await;
    let email = unique_email("verify");

    let resp = register(&client, &email).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let user: Value = resp.json().await.expect("user body");
    assert_eq!(user["is_verified"], false);

    let resp = login(&client, &email).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = resp.json().await.expect("error body");
    assert_eq!(body["detail"], "Email not verified");

    let token = latest_token(&pool, &email).await.expect("token was issued");
    assert_eq!(verify(&client, token).await.status(), StatusCode::OK);

    let resp = login(&client, &email).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("token body");
    assert_eq!(body["token_type"], "bearer");
    assert!(body["access_token"].as_str().is_some_and(|t| !t.is_empty()));

    // Single use: the token and any siblings are gone
    assert_eq!(verify(&client, token).await.status(), StatusCode::BAD_REQUEST);
    assert!(latest_token(&pool, &email).await.is_none());
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_expired_token_must_be_reissued() {
    let client = Client::new();
    let pool = e2e_pool().await;
    let email = unique_email("expired");

    assert_eq!(register(&client, &email).await.status(), StatusCode::CREATED);
    let token = latest_token(&pool, &email).await.expect("token was issued");

    sqlx::query(
        "UPDATE verification_tokens SET expires_at = NOW() - INTERVAL '1 hour' WHERE token = $1",
    )
    .bind(token)
    .execute(&pool)
    .await
    .expect("Failed to expire token");

    let resp = verify(&client, token).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("error body");
    assert_eq!(body["detail"], "Verification token has expired");
    assert!(latest_token(&pool, &email).await.is_none());

    let resp = client
        .post(format!("{}/api/v1/auth/resend-verification", api_base_url()))
        .json(&json!({"email": email}))
        .send()
        .await
        .expect("Failed to resend");
    assert_eq!(resp.status(), StatusCode::OK);

    let fresh = latest_token(&pool, &email).await.expect("fresh token");
    assert_ne!(fresh, token);
    assert_eq!(verify(&client, fresh).await.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_resend_does_not_reveal_accounts() {
    let client = Client::new();
    let known = unique_email("known");
    assert_eq!(register(&client, &known).await.status(), StatusCode::CREATED);

    let mut bodies = Vec::new();
    for email in [known, unique_email("unknown")] {
        let resp = client
            .post(format!("{}/api/v1/auth/resend-verification", api_base_url()))
            .json(&json!({"email": email}))
            .send()
            .await
            .expect("Failed to resend");
        assert_eq!(resp.status(), StatusCode::OK);
        bodies.push(resp.text().await.expect("body"));
    }

    assert_eq!(bodies[0], bodies[1]);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_duplicate_registration_is_rejected() {
    let client = Client::new();
    let email = unique_email("dup");

    assert_eq!(register(&client, &email).await.status(), StatusCode::CREATED);

    let resp = register(&client, &email).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("error body");
    assert_eq!(body["detail"], "User with this email already exists");
}

// ============================================================================
// Token lifecycle
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_logout_revokes_token() {
    let client = Client::new();
    let pool = e2e_pool().await;
    let email = unique_email("logout");

    assert_eq!(register(&client, &email).await.status(), StatusCode::CREATED);
    let token = latest_token(&pool, &email).await.expect("token was issued");
    assert_eq!(verify(&client, token).await.status(), StatusCode::OK);

    let body: Value = login(&client, &email).await.json().await.expect("token body");
    let access = body["access_token"].as_str().expect("access token").to_owned();
    let base = api_base_url();

    let me = client
        .get(format!("{base}/api/v1/auth/me"))
        .bearer_auth(&access)
        .send()
        .await
        .expect("Failed to fetch profile");
    assert_eq!(me.status(), StatusCode::OK);

    let refreshed: Value = client
        .post(format!("{base}/api/v1/auth/refresh"))
        .bearer_auth(&access)
        .send()
        .await
        .expect("Failed to refresh")
        .json()
        .await
        .expect("token body");
    let rotated = refreshed["access_token"].as_str().expect("access token").to_owned();

    let stale = client
        .get(format!("{base}/api/v1/auth/me"))
        .bearer_auth(&access)
        .send()
        .await
        .expect("Failed to fetch profile");
    assert_eq!(stale.status(), StatusCode::UNAUTHORIZED);

    let logout = client
        .post(format!("{base}/api/v1/auth/logout"))
        .bearer_auth(&rotated)
        .send()
        .await
        .expect("Failed to log out");
    assert_eq!(logout.status(), StatusCode::NO_CONTENT);

    let after = client
        .get(format!("{base}/api/v1/auth/me"))
        .bearer_auth(&rotated)
        .send()
        .await
        .expect("Failed to fetch profile");
    assert_eq!(after.status(), StatusCode::UNAUTHORIZED);
}
