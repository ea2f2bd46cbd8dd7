//! Outbound delivery channel abstractions.
//!
//! Provider SDK specifics stay behind these traits; the dispatcher only sees
//! success or a failure carrying the provider's detail.

use async_trait::async_trait;
use thiserror::Error;

/// Failure delivering a message.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The provider answered but refused the message.
    #[error("provider rejected message (code {code}): {detail}")]
    Rejected {
        /// Provider status code, verbatim.
        code: String,
        /// Provider message, verbatim.
        detail: String,
    },

    /// The request never completed (network, timeout, TLS, ...).
    #[error("transport failure: {0}")]
    Transport(String),
}

/// SMS delivery.
#[async_trait]
pub trait SmsTransport: Send + Sync {
    /// Sends `text` from `sender` to every number in `recipients`.
    async fn send(&self, recipients: &[String], sender: &str, text: &str)
    -> Result<(), DeliveryError>;
}

/// Email delivery.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// Sends a plain-text email to every address in `to`.
    async fn send(&self, to: &[String], subject: &str, body: &str) -> Result<(), DeliveryError>;
}
