//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `JWT_SECRET_KEY` - HMAC signing key for access tokens (min 32 chars, high entropy)
//!
//! ## Optional
//! - `APP_HOST` / `APP_PORT` - Bind address (default: 127.0.0.1:8000)
//! - `APP_NAME` - Display name used in responses and emails (default: Emporium API)
//! - `JWT_ALGORITHM` - HS256, HS384 or HS512 (default: HS256)
//! - `ACCESS_TOKEN_EXPIRE_MINUTES` - Access token lifetime (default: 30)
//! - `VERIFICATION_TOKEN_EXPIRE_HOURS` - Email verification link lifetime (default: 24)
//! - `CORS_ORIGINS` - Comma-separated allowed origins (default: <http://localhost:3000>)
//! - `FRONTEND_URL` - Base URL for links in emails (default: <http://localhost:3000>)
//! - `RESEND_API_KEY` - Resend API key; without it emails are only logged
//! - `EMAIL_FROM` / `EMAIL_FROM_NAME` - Sender identity
//! - `R2_ACCOUNT_ID`, `R2_ACCESS_KEY_ID`, `R2_SECRET_ACCESS_KEY`, `R2_BUCKET_NAME`,
//!   `R2_PUBLIC_URL` - Cloudflare R2 image storage (all or nothing)
//! - `STRIPE_SECRET_KEY`, `STRIPE_PUBLISHABLE_KEY`, `STRIPE_WEBHOOK_SECRET` - Stripe
//! - `PAYU_POS_ID`, `PAYU_CLIENT_ID`, `PAYU_CLIENT_SECRET`, `PAYU_SANDBOX` - `PayU`
//! - `ORDER_TAX_RATE` - Tax as a fraction of the subtotal (default: 0)
//! - `ORDER_SHIPPING_FLAT` - Flat shipping charge per order (default: 0)
//! - `RATE_LIMIT_ENABLED` - Per-IP limits on auth endpoints (default: true)
//! - `SENTRY_DSN` / `SENTRY_ENVIRONMENT` - Sentry error tracking

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use emporium_core::PaymentProvider;
use jsonwebtoken::Algorithm;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Display name of the shop
    pub app_name: String,
    /// Base URL of the web frontend, used for links in emails
    pub frontend_url: String,
    /// Origins allowed by CORS
    pub cors_origins: Vec<String>,
    /// Access token settings
    pub jwt: JwtConfig,
    /// Lifetime of email verification tokens in hours
    pub verification_token_ttl_hours: i64,
    /// Outbound email settings
    pub email: EmailConfig,
    /// Image storage, when configured
    pub storage: Option<StorageConfig>,
    /// Payment provider credentials
    pub payments: PaymentConfig,
    /// Order pricing rules
    pub pricing: PricingConfig,
    /// Whether auth endpoints are rate limited per client IP
    pub rate_limit_enabled: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// JWT access token configuration.
#[derive(Clone)]
pub struct JwtConfig {
    /// HMAC signing key
    pub secret: SecretString,
    /// HMAC algorithm
    pub algorithm: Algorithm,
    /// Access token lifetime in minutes
    pub access_token_ttl_minutes: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("algorithm", &self.algorithm)
            .field("access_token_ttl_minutes", &self.access_token_ttl_minutes)
            .finish()
    }
}

/// Outbound email configuration.
#[derive(Clone)]
pub struct EmailConfig {
    /// Resend API key; `None` selects the log-only mailer
    pub resend_api_key: Option<SecretString>,
    /// Sender address
    pub from_address: String,
    /// Sender display name
    pub from_name: String,
}

impl EmailConfig {
    /// The `From` header value, e.g. `Emporium <shop@example.com>`.
    #[must_use]
    pub fn sender(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_address)
    }
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field(
                "resend_api_key",
                &self.resend_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("from_address", &self.from_address)
            .field("from_name", &self.from_name)
            .finish()
    }
}

/// Cloudflare R2 bucket holding product images.
#[derive(Clone)]
pub struct StorageConfig {
    pub account_id: String,
    pub access_key_id: String,
    pub secret_access_key: SecretString,
    pub bucket_name: String,
    /// Public base URL the bucket is served from
    pub public_url: String,
}

impl StorageConfig {
    /// Public URL of an object key in the bucket.
    #[must_use]
    pub fn public_url_for(&self, key: &str) -> String {
        format!(
            "{}/{}",
            self.public_url.trim_end_matches('/'),
            key.trim_start_matches('/')
        )
    }

    /// S3-compatible endpoint of the account.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("https://{}.r2.cloudflarestorage.com", self.account_id)
    }
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("account_id", &self.account_id)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field("bucket_name", &self.bucket_name)
            .field("public_url", &self.public_url)
            .finish()
    }
}

/// Stripe credentials.
#[derive(Clone)]
pub struct StripeConfig {
    pub secret_key: SecretString,
    pub publishable_key: Option<String>,
    pub webhook_secret: Option<SecretString>,
}

/// `PayU` credentials.
#[derive(Clone)]
pub struct PayuConfig {
    pub pos_id: String,
    pub client_id: String,
    pub client_secret: SecretString,
    pub sandbox: bool,
}

/// Payment providers. A provider is enabled when its credentials are present.
#[derive(Clone, Default)]
pub struct PaymentConfig {
    pub stripe: Option<StripeConfig>,
    pub payu: Option<PayuConfig>,
}

impl PaymentConfig {
    /// Whether orders may be recorded as paid through `provider`.
    #[must_use]
    pub const fn is_enabled(&self, provider: PaymentProvider) -> bool {
        match provider {
            PaymentProvider::Stripe => self.stripe.is_some(),
            PaymentProvider::Payu => self.payu.is_some(),
        }
    }

    /// Enabled providers, Stripe first.
    #[must_use]
    pub fn enabled_providers(&self) -> Vec<PaymentProvider> {
        [PaymentProvider::Stripe, PaymentProvider::Payu]
            .into_iter()
            .filter(|p| self.is_enabled(*p))
            .collect()
    }
}

impl std::fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("stripe", &self.stripe.as_ref().map(|_| "[REDACTED]"))
            .field(
                "payu",
                &self
                    .payu
                    .as_ref()
                    .map(|p| format!("pos_id={} sandbox={}", p.pos_id, p.sandbox)),
            )
            .finish()
    }
}

/// Order pricing rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct PricingConfig {
    /// Tax as a fraction of the subtotal (0.23 = 23%)
    pub tax_rate: Decimal,
    /// Flat shipping charge per order, in the order currency
    pub shipping_flat: Decimal,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from a fixed set of variables.
    ///
    /// # Errors
    ///
    /// Same as [`ApiConfig::from_env`].
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let database_url = SecretString::from(env.required("DATABASE_URL")?);
        let host = env.parse_or("APP_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = env.parse_or("APP_PORT", 8000_u16)?;
        let app_name = env.or_default("APP_NAME", "Emporium API");
        let frontend_url = env
            .or_default("FRONTEND_URL", "http://localhost:3000")
            .trim_end_matches('/')
            .to_owned();
        let cors_origins = parse_list(&env.or_default("CORS_ORIGINS", "http://localhost:3000"));

        let jwt = JwtConfig::load(&env)?;
        let verification_token_ttl_hours = env.parse_or("VERIFICATION_TOKEN_EXPIRE_HOURS", 24_i64)?;
        if verification_token_ttl_hours <= 0 {
            return Err(ConfigError::InvalidEnvVar(
                "VERIFICATION_TOKEN_EXPIRE_HOURS".to_owned(),
                "must be positive".to_owned(),
            ));
        }

        let email = EmailConfig {
            resend_api_key: env.optional("RESEND_API_KEY").map(SecretString::from),
            from_address: env.or_default("EMAIL_FROM", "onboarding@resend.dev"),
            from_name: env.or_default("EMAIL_FROM_NAME", "Emporium"),
        };

        let storage = StorageConfig::load(&env)?;
        let payments = PaymentConfig::load(&env)?;
        let pricing = PricingConfig::load(&env)?;
        let rate_limit_enabled = env.parse_or("RATE_LIMIT_ENABLED", true)?;

        Ok(Self {
            database_url,
            host,
            port,
            app_name,
            frontend_url,
            cors_origins,
            jwt,
            verification_token_ttl_hours,
            email,
            storage,
            payments,
            pricing,
            rate_limit_enabled,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl JwtConfig {
    fn load(env: &Env<'_>) -> Result<Self, ConfigError> {
        let secret = env.required("JWT_SECRET_KEY")?;
        validate_jwt_secret(&secret, "JWT_SECRET_KEY")?;

        let algorithm = parse_hmac_algorithm(&env.or_default("JWT_ALGORITHM", "HS256"))?;
        let access_token_ttl_minutes = env.parse_or("ACCESS_TOKEN_EXPIRE_MINUTES", 30_i64)?;
        if access_token_ttl_minutes <= 0 {
            return Err(ConfigError::InvalidEnvVar(
                "ACCESS_TOKEN_EXPIRE_MINUTES".to_owned(),
                "must be positive".to_owned(),
            ));
        }

        Ok(Self {
            secret: SecretString::from(secret),
            algorithm,
            access_token_ttl_minutes,
        })
    }
}

impl StorageConfig {
    fn load(env: &Env<'_>) -> Result<Option<Self>, ConfigError> {
        let keys = [
            "R2_ACCOUNT_ID",
            "R2_ACCESS_KEY_ID",
            "R2_SECRET_ACCESS_KEY",
            "R2_BUCKET_NAME",
            "R2_PUBLIC_URL",
        ];
        let values: Vec<Option<String>> = keys.iter().map(|k| env.optional(k)).collect();

        match values.as_slice() {
            [
                Some(account_id),
                Some(access_key_id),
                Some(secret_access_key),
                Some(bucket_name),
                Some(public_url),
            ] => {
                url::Url::parse(public_url).map_err(|e| {
                    ConfigError::InvalidEnvVar("R2_PUBLIC_URL".to_owned(), e.to_string())
                })?;
                Ok(Some(Self {
                    account_id: account_id.clone(),
                    access_key_id: access_key_id.clone(),
                    secret_access_key: SecretString::from(secret_access_key.clone()),
                    bucket_name: bucket_name.clone(),
                    public_url: public_url.trim_end_matches('/').to_owned(),
                }))
            }
            _ if values.iter().all(Option::is_none) => Ok(None),
            _ => {
                let missing = keys
                    .iter()
                    .zip(&values)
                    .find(|(_, v)| v.is_none())
                    .map_or("R2_*", |(k, _)| *k);
                Err(ConfigError::MissingEnvVar(format!(
                    "{missing} (R2 storage is partially configured)"
                )))
            }
        }
    }
}

impl PaymentConfig {
    fn load(env: &Env<'_>) -> Result<Self, ConfigError> {
        let stripe = env.optional("STRIPE_SECRET_KEY").map(|secret| StripeConfig {
            secret_key: SecretString::from(secret),
            publishable_key: env.optional("STRIPE_PUBLISHABLE_KEY"),
            webhook_secret: env.optional("STRIPE_WEBHOOK_SECRET").map(SecretString::from),
        });

        let payu = match (
            env.optional("PAYU_POS_ID"),
            env.optional("PAYU_CLIENT_ID"),
            env.optional("PAYU_CLIENT_SECRET"),
        ) {
            (Some(pos_id), Some(client_id), Some(client_secret)) => Some(PayuConfig {
                pos_id,
                client_id,
                client_secret: SecretString::from(client_secret),
                sandbox: env.parse_or("PAYU_SANDBOX", true)?,
            }),
            _ => None,
        };

        Ok(Self { stripe, payu })
    }
}

impl PricingConfig {
    fn load(env: &Env<'_>) -> Result<Self, ConfigError> {
        let tax_rate: Decimal = env.parse_or("ORDER_TAX_RATE", Decimal::ZERO)?;
        if tax_rate.is_sign_negative() || tax_rate >= Decimal::ONE {
            return Err(ConfigError::InvalidEnvVar(
                "ORDER_TAX_RATE".to_owned(),
                "must be a fraction in [0, 1)".to_owned(),
            ));
        }

        let shipping_flat: Decimal = env.parse_or("ORDER_SHIPPING_FLAT", Decimal::ZERO)?;
        if shipping_flat.is_sign_negative() {
            return Err(ConfigError::InvalidEnvVar(
                "ORDER_SHIPPING_FLAT".to_owned(),
                "must not be negative".to_owned(),
            ));
        }

        Ok(Self {
            tax_rate,
            shipping_flat,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup with blank values treated as unset.
struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_owned()))
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_owned())
    }

    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string()))
        })
    }
}

/// Split a comma-separated list, dropping blanks and trailing slashes.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_end_matches('/'))
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Accept only the HMAC family; the key is a shared secret.
fn parse_hmac_algorithm(raw: &str) -> Result<Algorithm, ConfigError> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => Err(ConfigError::InvalidEnvVar(
            "JWT_ALGORITHM".to_owned(),
            format!("{other} is not supported (use HS256, HS384 or HS512)"),
        )),
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate length, placeholder patterns and entropy of the signing key.
fn validate_jwt_secret(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    if secret.chars().count() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
            format!(
                "must be at least {MIN_JWT_SECRET_LENGTH} characters (got {})",
                secret.chars().count()
            ),
        ));
    }

    let lower = secret.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(**p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Expose the signing key bytes.
pub(crate) fn jwt_secret_bytes(config: &JwtConfig) -> &[u8] {
    config.secret.expose_secret().as_bytes()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const STRONG_SECRET: &str = "q8Zr2vLx9Tn4Wk7Bc1Hm5Pd3Fs6Gj0Ye";

    fn base_vars() -> HashMap<String, String> {
        [
            ("DATABASE_URL", "postgres://localhost/emporium"),
            ("JWT_SECRET_KEY", STRONG_SECRET),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect()
    }

    fn with(mut vars: HashMap<String, String>, key: &str, value: &str) -> HashMap<String, String> {
        vars.insert(key.to_owned(), value.to_owned());
        vars
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::from_map(&base_vars()).unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8000");
        assert_eq!(config.jwt.algorithm, Algorithm::HS256);
        assert_eq!(config.jwt.access_token_ttl_minutes, 30);
        assert_eq!(config.verification_token_ttl_hours, 24);
        assert_eq!(config.cors_origins, vec!["http://localhost:3000"]);
        assert!(config.email.resend_api_key.is_none());
        assert!(config.storage.is_none());
        assert!(config.payments.enabled_providers().is_empty());
        assert_eq!(config.pricing.tax_rate, Decimal::ZERO);
        assert!(config.rate_limit_enabled);
    }

    #[test]
    fn test_missing_required() {
        let mut vars = base_vars();
        vars.remove("DATABASE_URL");
        assert!(matches!(
            ApiConfig::from_map(&vars),
            Err(ConfigError::MissingEnvVar(key)) if key == "DATABASE_URL"
        ));
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let vars = with(base_vars(), "JWT_SECRET_KEY", "   ");
        assert!(matches!(
            ApiConfig::from_map(&vars),
            Err(ConfigError::MissingEnvVar(_))
        ));
    }

    #[test]
    fn test_cors_origins_list() {
        let vars = with(
            base_vars(),
            "CORS_ORIGINS",
            "https://shop.example.org/, http://localhost:5173 ,,",
        );
        let config = ApiConfig::from_map(&vars).unwrap();
        assert_eq!(
            config.cors_origins,
            vec!["https://shop.example.org", "http://localhost:5173"]
        );
    }

    #[test]
    fn test_jwt_algorithm_must_be_hmac() {
        let vars = with(base_vars(), "JWT_ALGORITHM", "hs512");
        assert_eq!(
            ApiConfig::from_map(&vars).unwrap().jwt.algorithm,
            Algorithm::HS512
        );

        let vars = with(base_vars(), "JWT_ALGORITHM", "RS256");
        assert!(matches!(
            ApiConfig::from_map(&vars),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
    }

    #[test]
    fn test_invalid_port() {
        let vars = with(base_vars(), "APP_PORT", "eighty");
        assert!(matches!(
            ApiConfig::from_map(&vars),
            Err(ConfigError::InvalidEnvVar(key, _)) if key == "APP_PORT"
        ));
    }

    #[test]
    fn test_shannon_entropy() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy(STRONG_SECRET) > MIN_ENTROPY_BITS_PER_CHAR);
    }

    #[test]
    fn test_jwt_secret_too_short() {
        assert!(matches!(
            validate_jwt_secret("aB3$xY9!", "TEST"),
            Err(ConfigError::InsecureSecret(_, _))
        ));
    }

    #[test]
    fn test_jwt_secret_placeholder() {
        let result = validate_jwt_secret("your-jwt-key-goes-here-0123456789abcdef", "TEST");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_jwt_secret_low_entropy() {
        let result = validate_jwt_secret(&"ab".repeat(20), "TEST");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_jwt_secret_valid() {
        assert!(validate_jwt_secret(STRONG_SECRET, "TEST").is_ok());
    }

    #[test]
    fn test_storage_all_or_nothing() {
        let vars = with(base_vars(), "R2_BUCKET_NAME", "images");
        assert!(matches!(
            ApiConfig::from_map(&vars),
            Err(ConfigError::MissingEnvVar(msg)) if msg.starts_with("R2_ACCOUNT_ID")
        ));

        let mut vars = base_vars();
        for (k, v) in [
            ("R2_ACCOUNT_ID", "acc"),
            ("R2_ACCESS_KEY_ID", "key"),
            ("R2_SECRET_ACCESS_KEY", "s3cr3t"),
            ("R2_BUCKET_NAME", "images"),
            ("R2_PUBLIC_URL", "https://cdn.emporium.test/"),
        ] {
            vars = with(vars, k, v);
        }
        let storage = ApiConfig::from_map(&vars).unwrap().storage.unwrap();
        assert_eq!(
            storage.public_url_for("/products/mug.jpg"),
            "https://cdn.emporium.test/products/mug.jpg"
        );
        assert_eq!(storage.endpoint(), "https://acc.r2.cloudflarestorage.com");
    }

    #[test]
    fn test_payment_providers_enabled_by_credentials() {
        let mut vars = with(base_vars(), "STRIPE_SECRET_KEY", "sk_test_123");
        vars = with(vars, "PAYU_POS_ID", "300746");
        vars = with(vars, "PAYU_CLIENT_ID", "300746");
        let config = ApiConfig::from_map(&vars).unwrap();
        assert_eq!(
            config.payments.enabled_providers(),
            vec![PaymentProvider::Stripe]
        );

        vars = with(vars, "PAYU_CLIENT_SECRET", "2ee86a66e5d97e3fadc400c9f19b065d");
        let config = ApiConfig::from_map(&vars).unwrap();
        assert!(config.payments.is_enabled(PaymentProvider::Payu));
        assert!(config.payments.payu.unwrap().sandbox);
    }

    #[test]
    fn test_pricing_bounds() {
        let vars = with(base_vars(), "ORDER_TAX_RATE", "0.23");
        let config = ApiConfig::from_map(&vars).unwrap();
        assert_eq!(config.pricing.tax_rate, Decimal::new(23, 2));

        let vars = with(base_vars(), "ORDER_TAX_RATE", "1.5");
        assert!(ApiConfig::from_map(&vars).is_err());

        let vars = with(base_vars(), "ORDER_SHIPPING_FLAT", "-1");
        assert!(ApiConfig::from_map(&vars).is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let vars = with(base_vars(), "RESEND_API_KEY", "re_live_supersecret");
        let config = ApiConfig::from_map(&vars).unwrap();
        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains(STRONG_SECRET));
        assert!(!debug_output.contains("re_live_supersecret"));
    }

    #[test]
    fn test_email_sender() {
        let vars = with(base_vars(), "EMAIL_FROM", "shop@emporium.test");
        let config = ApiConfig::from_map(&vars).unwrap();
        assert_eq!(config.email.sender(), "Emporium <shop@emporium.test>");
    }
}
