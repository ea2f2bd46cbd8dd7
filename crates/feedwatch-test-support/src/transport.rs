//! Test transports — recording and failing SMS/email transports.

use std::sync::Mutex;

use async_trait::async_trait;
use feedwatch_core::transport::{DeliveryError, EmailTransport, SmsTransport};

/// An SMS captured by [`RecordingSmsTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentSms {
    /// Recipients, as passed.
    pub recipients: Vec<String>,
    /// Sender identity.
    pub sender: String,
    /// Message body.
    pub text: String,
}

/// An email captured by [`RecordingEmailTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    /// Recipients, as passed.
    pub to: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

/// An SMS transport that records every message and always succeeds.
#[derive(Debug, Default)]
pub struct RecordingSmsTransport {
    sent: Mutex<Vec<SentSms>>,
}

impl RecordingSmsTransport {
    /// Creates an empty transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every message sent.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn sent(&self) -> Vec<SentSms> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl SmsTransport for RecordingSmsTransport {
    async fn send(
        &self,
        recipients: &[String],
        sender: &str,
        text: &str,
    ) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push(SentSms {
            recipients: recipients.to_vec(),
            sender: sender.to_owned(),
            text: text.to_owned(),
        });
        Ok(())
    }
}

/// An SMS transport whose provider rejects every message.
#[derive(Debug)]
pub struct FailingSmsTransport;

#[async_trait]
impl SmsTransport for FailingSmsTransport {
    async fn send(
        &self,
        _recipients: &[String],
        _sender: &str,
        _text: &str,
    ) -> Result<(), DeliveryError> {
        Err(DeliveryError::Rejected {
            code: "411".into(),
            detail: "invalid receptor".into(),
        })
    }
}

/// An email transport that records every message and always succeeds.
#[derive(Debug, Default)]
pub struct RecordingEmailTransport {
    sent: Mutex<Vec<SentEmail>>,
}

impl RecordingEmailTransport {
    /// Creates an empty transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every email sent.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailTransport for RecordingEmailTransport {
    async fn send(&self, to: &[String], subject: &str, body: &str) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push(SentEmail {
            to: to.to_vec(),
            subject: subject.to_owned(),
            body: body.to_owned(),
        });
        Ok(())
    }
}

/// An email transport that always times out.
#[derive(Debug)]
pub struct FailingEmailTransport;

#[async_trait]
impl EmailTransport for FailingEmailTransport {
    async fn send(
        &self,
        _to: &[String],
        _subject: &str,
        _body: &str,
    ) -> Result<(), DeliveryError> {
        Err(DeliveryError::Transport("connection timed out".into()))
    }
}
