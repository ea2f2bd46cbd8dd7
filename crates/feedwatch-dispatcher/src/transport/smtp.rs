//! SMTP email transport.

use async_trait::async_trait;
use feedwatch_core::transport::{DeliveryError, EmailTransport};
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;

const IMPLICIT_TLS_PORT: u16 = 465;

/// Sends plain-text email through an authenticated SMTP relay.
pub struct SmtpEmailTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailTransport {
    /// Builds a transport. Port 465 uses implicit TLS, any other port
    /// STARTTLS. No connection is opened until the first send.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::Transport` if the relay or the `From` address
    /// is invalid.
    pub fn new(config: &SmtpConfig) -> Result<Self, DeliveryError> {
        let builder = if config.port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        }
        .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let mailer = builder
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();
        let from = parse_mailbox(&config.from)?;
        Ok(Self { mailer, from })
    }
}

impl std::fmt::Debug for SmtpEmailTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpEmailTransport")
            .field("from", &self.from.to_string())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl EmailTransport for SmtpEmailTransport {
    async fn send(&self, to: &[String], subject: &str, body: &str) -> Result<(), DeliveryError> {
        let message = build_message(&self.from, to, subject, body)?;
        self.mailer.send(message).await.map_err(|e| match e.status() {
            Some(code) => DeliveryError::Rejected {
                code: code.to_string(),
                detail: e.to_string(),
            },
            None => DeliveryError::Transport(e.to_string()),
        })?;
        Ok(())
    }
}

fn parse_mailbox(raw: &str) -> Result<Mailbox, DeliveryError> {
    raw.parse()
        .map_err(|e| DeliveryError::Transport(format!("invalid address {raw:?}: {e}")))
}

fn build_message(
    from: &Mailbox,
    to: &[String],
    subject: &str,
    body: &str,
) -> Result<Message, DeliveryError> {
    let mut builder = Message::builder()
        .from(from.clone())
        .subject(subject)
        .header(ContentType::TEXT_PLAIN);
    for address in to {
        builder = builder.to(parse_mailbox(address)?);
    }
    builder
        .body(body.to_owned())
        .map_err(|e| DeliveryError::Transport(e.to_string()))
}
