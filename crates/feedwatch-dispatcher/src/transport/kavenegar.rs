//! Kavenegar HTTP SMS transport.
//!
//! `POST {base}/v1/{api_key}/sms/send.json` with a form body of `receptor`
//! (comma-separated), `sender` and `message`. The provider wraps every
//! answer in `{"return": {"status": .., "message": ..}}`; only HTTP 2xx with
//! `return.status == 200` counts as delivered.

use std::time::Duration;

use async_trait::async_trait;
use feedwatch_core::transport::{DeliveryError, SmsTransport};
use serde::Deserialize;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const ACCEPTED: i64 = 200;

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(rename = "return")]
    result: ReturnStatus,
}

#[derive(Debug, Deserialize)]
struct ReturnStatus {
    status: i64,
    #[serde(default)]
    message: String,
}

/// Sends SMS through the Kavenegar REST API.
pub struct KavenegarSmsTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl KavenegarSmsTransport {
    /// Creates a transport for `api_key` against `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::Transport` if the HTTP client cannot be built.
    pub fn new(api_key: &str, base_url: &str) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/v1/{}/sms/send.json",
                base_url.trim_end_matches('/'),
                api_key.trim()
            ),
        })
    }
}

impl std::fmt::Debug for KavenegarSmsTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KavenegarSmsTransport").finish_non_exhaustive()
    }
}

#[async_trait]
impl SmsTransport for KavenegarSmsTransport {
    async fn send(
        &self,
        recipients: &[String],
        sender: &str,
        text: &str,
    ) -> Result<(), DeliveryError> {
        let receptor = recipients.join(",");
        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("receptor", receptor.as_str()), ("sender", sender), ("message", text)])
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.without_url().to_string()))?;

        let http_status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DeliveryError::Transport(e.without_url().to_string()))?;

        match serde_json::from_str::<SendResponse>(&body) {
            Ok(parsed) if http_status.is_success() && parsed.result.status == ACCEPTED => {
                debug!(recipients = recipients.len(), "provider accepted sms");
                Ok(())
            }
            Ok(parsed) => Err(DeliveryError::Rejected {
                code: parsed.result.status.to_string(),
                detail: parsed.result.message,
            }),
            Err(_) => Err(DeliveryError::Rejected {
                code: http_status.as_u16().to_string(),
                detail: body,
            }),
        }
    }
}
