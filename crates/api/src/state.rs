//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::services::auth::JwtKeys;
use crate::services::email::{Mailer, MailerError};

/// Upper bound on remembered revoked token IDs.
const REVOKED_CACHE_CAPACITY: u64 = 100_000;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    jwt: JwtKeys,
    mailer: Mailer,
    revoked_tokens: Cache<Uuid, ()>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - API configuration
    /// * `pool` - `PostgreSQL` connection pool
    ///
    /// # Errors
    ///
    /// Returns an error if the mail client cannot be built.
    pub fn new(config: ApiConfig, pool: PgPool) -> Result<Self, MailerError> {
        let jwt = JwtKeys::new(&config.jwt);
        let mailer = Mailer::from_config(&config.email)?;

        // A revoked token is useless once it would have expired anyway
        let ttl = jwt.ttl().to_std().unwrap_or(Duration::from_secs(30 * 60));
        let revoked_tokens = Cache::builder()
            .max_capacity(REVOKED_CACHE_CAPACITY)
            .time_to_live(ttl)
            .build();

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                jwt,
                mailer,
                revoked_tokens,
            }),
        })
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get the access token keys.
    #[must_use]
    pub fn jwt(&self) -> &JwtKeys {
        &self.inner.jwt
    }

    /// Get the outbound mailer.
    #[must_use]
    pub fn mailer(&self) -> &Mailer {
        &self.inner.mailer
    }

    /// Get the in-memory set of recently revoked token IDs.
    ///
    /// A hit means revoked; a miss must fall back to the database.
    #[must_use]
    pub fn revoked_tokens(&self) -> &Cache<Uuid, ()> {
        &self.inner.revoked_tokens
    }
}
