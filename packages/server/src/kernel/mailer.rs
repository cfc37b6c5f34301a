//! SMTP delivery via lettre.

use std::time::Duration;

use anyhow::{Context, Result};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::info;

use crate::kernel::{BaseMailer, OutgoingMessage};

pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const DEFAULT_SMTP_FROM: &str = "112@emergency.local";
pub const DEFAULT_SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for the outbound relay.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
    /// Implicit TLS from the first byte. When false the session is upgraded
    /// with STARTTLS.
    pub use_ssl: bool,
    pub timeout: Duration,
}

/// Blocking SMTP mailer.
///
/// Each `send` opens a fresh session on the relay.
pub struct SmtpMailer {
    transport: SmtpTransport,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let builder = if config.use_ssl {
            SmtpTransport::relay(&config.host)
        } else {
            SmtpTransport::starttls_relay(&config.host)
        }
        .with_context(|| format!("Invalid SMTP relay host: {}", config.host))?;

        let mut builder = builder
            .port(config.port)
            .timeout(Some(config.timeout));

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let from: Mailbox = config
            .from
            .parse()
            .with_context(|| format!("Invalid SMTP sender address: {}", config.from))?;

        info!(
            host = %config.host,
            port = config.port,
            implicit_tls = config.use_ssl,
            "SMTP mailer configured"
        );

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

impl BaseMailer for SmtpMailer {
    fn send(&self, message: &OutgoingMessage) -> Result<()> {
        let to: Mailbox = message
            .to
            .parse()
            .with_context(|| format!("Invalid recipient address: {}", message.to))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .context("Failed to build mail message")?;

        self.transport
            .send(&email)
            .context("SMTP delivery failed")?;

        Ok(())
    }
}
