//! Transactional email.
//!
//! Messages go through the Resend HTTP API when `RESEND_API_KEY` is set.
//! Without a key the mailer only logs what it would have sent, which keeps
//! local development and tests free of network calls.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::config::EmailConfig;

/// Resend send-email endpoint.
const RESEND_URL: &str = "https://api.resend.com/emails";

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum MailerError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider rejected the message.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Client could not be configured.
    #[error("configuration error: {0}")]
    Config(String),
}

/// A rendered email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: Option<String>,
}

/// Request body for `POST /emails`.
#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

/// Outbound email sender.
#[derive(Clone)]
pub enum Mailer {
    /// Deliver through Resend.
    Resend(ResendClient),
    /// Log messages instead of sending them.
    Log { sender: String },
}

impl Mailer {
    /// Build the mailer for `config`.
    ///
    /// # Errors
    ///
    /// Returns `MailerError` if the HTTP client cannot be built.
    pub fn from_config(config: &EmailConfig) -> Result<Self, MailerError> {
        match &config.resend_api_key {
            Some(key) => Ok(Self::Resend(ResendClient::new(
                key.expose_secret(),
                config.sender(),
            )?)),
            None => Ok(Self::Log {
                sender: config.sender(),
            }),
        }
    }

    /// Send a message.
    ///
    /// # Errors
    ///
    /// Returns `MailerError` if delivery fails.
    pub async fn send(&self, message: &EmailMessage) -> Result<(), MailerError> {
        match self {
            Self::Resend(client) => client.send(message).await,
            Self::Log { sender } => {
                tracing::info!(
                    from = %sender,
                    to = %message.to,
                    subject = %message.subject,
                    "Email delivery disabled, logging message"
                );
                // Bodies carry live verification links
                tracing::debug!(
                    to = %message.to,
                    body = message.text.as_deref().unwrap_or(&message.html),
                    "Logged email body"
                );
                Ok(())
            }
        }
    }

    /// Whether messages actually leave the process.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Resend(_))
    }
}

/// Minimal Resend API client.
#[derive(Clone)]
pub struct ResendClient {
    client: reqwest::Client,
    sender: String,
}

impl ResendClient {
    /// Create a client authenticated with `api_key` that sends as `sender`.
    ///
    /// # Errors
    ///
    /// Returns error if the key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(api_key: &str, sender: String) -> Result<Self, MailerError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|e| MailerError::Config(format!("Invalid API key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self { client, sender })
    }

    async fn send(&self, message: &EmailMessage) -> Result<(), MailerError> {
        let body = SendEmailRequest {
            from: &self.sender,
            to: [&message.to],
            subject: &message.subject,
            html: &message.html,
            text: message.text.as_deref(),
        };

        let response = self.client.post(RESEND_URL).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MailerError::Api {
                status: status.as_u16(),
                message,
            });
        }

        tracing::debug!(to = %message.to, "Email accepted by Resend");
        Ok(())
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Shop identity used in templates.
#[derive(Debug, Clone, Copy)]
pub struct Branding<'a> {
    /// Name shown to customers (`EMAIL_FROM_NAME`)
    pub shop_name: &'a str,
    /// Frontend base URL without trailing slash
    pub frontend_url: &'a str,
}

/// Link the frontend uses to redeem a verification token.
#[must_use]
pub fn verification_link(frontend_url: &str, token: Uuid) -> String {
    format!("{frontend_url}/verify-email?token={token}")
}

/// Email asking a new user to confirm their address.
#[must_use]
pub fn verification_email(
    brand: Branding<'_>,
    to: &str,
    name: &str,
    token: Uuid,
    ttl_hours: i64,
) -> EmailMessage {
    let link = verification_link(brand.frontend_url, token);
    let shop = escape_html(brand.shop_name);
    let greeting = escape_html(name);

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Verify your email</title></head>
<body style="font-family: -apple-system, 'Segoe UI', Roboto, Arial, sans-serif; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
  <h1 style="color: #2563eb;">Welcome to {shop}!</h1>
  <p>Hi {greeting},</p>
  <p>Thank you for registering with {shop}. To complete your registration, please verify your email address:</p>
  <p style="text-align: center;">
    <a href="{link}" style="display: inline-block; padding: 14px 32px; background-color: #2563eb; color: #ffffff; text-decoration: none; border-radius: 6px;">Verify Email Address</a>
  </p>
  <p>Or copy and paste this link into your browser:</p>
  <p style="word-break: break-all;">{link}</p>
  <p><strong>This link will expire in {ttl_hours} hours.</strong></p>
  <p>If you didn't create an account with us, you can safely ignore this email.</p>
</body>
</html>"#
    );

    let text = format!(
        "Welcome to {shop_name}!\n\n\
         Hi {name},\n\n\
         Thank you for registering! To verify your email address, open the link below:\n\n\
         {link}\n\n\
         This link will expire in {ttl_hours} hours.\n\n\
         If you didn't create an account with us, you can safely ignore this email.\n",
        shop_name = brand.shop_name,
    );

    EmailMessage {
        to: to.to_owned(),
        subject: format!("{} - Verify your email address", brand.shop_name),
        html,
        text: Some(text),
    }
}

/// Email sent once an address has been verified.
#[must_use]
pub fn welcome_email(brand: Branding<'_>, to: &str, name: &str) -> EmailMessage {
    let shop = escape_html(brand.shop_name);
    let greeting = escape_html(name);
    let frontend_url = brand.frontend_url;

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Welcome!</title></head>
<body style="font-family: -apple-system, 'Segoe UI', Roboto, Arial, sans-serif; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
  <h1 style="color: #2563eb; text-align: center;">Email Verified!</h1>
  <p>Hi {greeting},</p>
  <p>Your email has been successfully verified. You can now enjoy all features of {shop}!</p>
  <p style="text-align: center;">
    <a href="{frontend_url}" style="display: inline-block; padding: 14px 32px; background-color: #2563eb; color: #ffffff; text-decoration: none; border-radius: 6px;">Start Shopping</a>
  </p>
  <p>Happy shopping!</p>
</body>
</html>"#
    );

    let text = format!(
        "Hi {name},\n\n\
         Your email has been successfully verified. You can now enjoy all features of {shop_name}!\n\n\
         {frontend_url}\n",
        shop_name = brand.shop_name,
    );

    EmailMessage {
        to: to.to_owned(),
        subject: format!("Welcome to {}!", brand.shop_name),
        html,
        text: Some(text),
    }
}

/// Escape text for interpolation into HTML.
fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::Layer;
    use tracing_subscriber::layer::{Context, SubscriberExt};

    use super::*;

    const BRAND: Branding<'static> = Branding {
        shop_name: "Emporium",
        frontend_url: "https://shop.emporium.test",
    };

    #[test]
    fn test_verification_link() {
        let token = Uuid::nil();
        assert_eq!(
            verification_link("https://shop.emporium.test", token),
            "https://shop.emporium.test/verify-email?token=00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_verification_email_contents() {
        let token = Uuid::new_v4();
        let msg = verification_email(BRAND, "ada@example.com", "Ada", token, 24);

        assert_eq!(msg.to, "ada@example.com");
        assert_eq!(msg.subject, "Emporium - Verify your email address");
        assert!(msg.html.contains(&token.to_string()));
        assert!(msg.html.contains("expire in 24 hours"));
        let text = msg.text.unwrap();
        assert!(text.contains(&verification_link(BRAND.frontend_url, token)));
        assert!(text.contains("24 hours"));
    }

    #[test]
    fn test_templates_escape_names() {
        let msg = welcome_email(BRAND, "x@example.com", "<script>alert(1)</script>");
        assert!(!msg.html.contains("<script>"));
        assert!(msg.html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_send_request_shape() {
        let body = SendEmailRequest {
            from: "Emporium <shop@emporium.test>",
            to: ["ada@example.com"],
            subject: "Hi",
            html: "<p>Hi</p>",
            text: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["to"], serde_json::json!(["ada@example.com"]));
        assert!(json.get("text").is_none());
    }

    /// Records the level and field names of every event.
    #[derive(Clone, Default)]
    struct CapturedEvents(Arc<Mutex<Vec<(tracing::Level, Vec<&'static str>)>>>);

    impl<S: tracing::Subscriber> Layer<S> for CapturedEvents {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            let fields = event.metadata().fields().iter().map(|f| f.name()).collect();
            self.0
                .lock()
                .unwrap()
                .push((*event.metadata().level(), fields));
        }
    }

    #[tokio::test]
    async fn test_log_mailer_keeps_body_out_of_info() {
        let captured = CapturedEvents::default();
        let _guard =
            tracing::subscriber::set_default(tracing_subscriber::registry().with(captured.clone()));

        let mailer = Mailer::Log {
            sender: "Emporium <shop@emporium.test>".to_owned(),
        };
        let msg = verification_email(BRAND, "ada@example.com", "Ada", Uuid::new_v4(), 24);
        mailer.send(&msg).await.unwrap();

        let events = captured.0.lock().unwrap();
        let logged_subject = events
            .iter()
            .any(|(level, fields)| *level == tracing::Level::INFO && fields.contains(&"subject"));
        assert!(logged_subject);
        let body_levels: Vec<_> = events
            .iter()
            .filter(|(_, fields)| fields.contains(&"body"))
            .map(|(level, _)| *level)
            .collect();
        assert_eq!(body_levels, vec![tracing::Level::DEBUG]);
    }

    #[tokio::test]
    async fn test_log_mailer_never_fails() {
        let mailer = Mailer::Log {
            sender: "Emporium <shop@emporium.test>".to_owned(),
        };
        assert!(!mailer.is_live());
        let msg = welcome_email(BRAND, "ada@example.com", "Ada");
        assert!(mailer.send(&msg).await.is_ok());
    }
}
