//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                                  - Service banner
//! GET  /health                            - Liveness
//! GET  /health/ready                      - Readiness (database)
//!
//! # Auth
//! POST /api/v1/auth/register              - Create unverified account
//! POST /api/v1/auth/login                 - Email + password -> bearer token
//! POST /api/v1/auth/verify-email          - Redeem verification token
//! POST /api/v1/auth/resend-verification   - Issue a new verification link
//! POST /api/v1/auth/refresh               - Rotate bearer token
//! POST /api/v1/auth/logout                - Revoke bearer token
//! GET  /api/v1/auth/me                    - Own profile
//! PUT  /api/v1/auth/me                    - Update own profile
//!
//! # Catalog (writes are admin only)
//! GET    /api/v1/categories               - List with product counts
//! POST   /api/v1/categories
//! GET    /api/v1/categories/{id}
//! PUT    /api/v1/categories/{id}
//! DELETE /api/v1/categories/{id}
//! GET    /api/v1/categories/slug/{slug}
//! GET    /api/v1/products                 - Filtered, paginated listing
//! POST   /api/v1/products
//! GET    /api/v1/products/featured
//! GET    /api/v1/products/{id}
//! PUT    /api/v1/products/{id}
//! DELETE /api/v1/products/{id}
//! GET    /api/v1/products/slug/{slug}
//!
//! # Orders (bearer required)
//! POST   /api/v1/orders                   - Place order
//! GET    /api/v1/orders                   - Own orders (all for admins)
//! GET    /api/v1/orders/{id}
//! PUT    /api/v1/orders/{id}              - Admin status/payment update
//! DELETE /api/v1/orders/{id}              - Cancel
//! ```

pub mod auth;
pub mod categories;
pub mod health;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::db::RepositoryError;
use crate::error::AppError;
use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// All routes, with per-IP rate limits when `rate_limit` is set.
pub fn routes(rate_limit: bool) -> Router<AppState> {
    let mut auth = auth_routes();
    let mut api = Router::new()
        .nest("/categories", category_routes())
        .nest("/products", product_routes())
        .nest("/orders", order_routes());

    if rate_limit {
        auth = auth.layer(auth_rate_limiter());
        api = api.layer(api_rate_limiter());
    }

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api/v1", api.nest("/auth", auth))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/verify-email", post(auth::verify_email))
        .route("/resend-verification", post(auth::resend_verification))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me).put(auth::update_me))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::list).post(categories::create))
        .route(
            "/{id}",
            get(categories::get)
                .put(categories::update)
                .delete(categories::delete),
        )
        .route("/slug/{slug}", get(categories::get_by_slug))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list).post(products::create))
        .route("/featured", get(products::featured))
        .route(
            "/{id}",
            get(products::get)
                .put(products::update)
                .delete(products::delete),
        )
        .route("/slug/{slug}", get(products::get_by_slug))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list).post(orders::create))
        .route(
            "/{id}",
            get(orders::get).put(orders::update).delete(orders::cancel),
        )
}

/// Map `RepositoryError::NotFound` to a 404 naming the missing resource.
fn not_found(message: &'static str) -> impl FnOnce(RepositoryError) -> AppError {
    move |e| match e {
        RepositoryError::NotFound => AppError::NotFound(message.to_owned()),
        other => AppError::Database(other),
    }
}
