//! Delivery through the gate to the configured transports.
//!
//! Every outcome is logged here. Transport failures are logged with the
//! provider detail verbatim and never retried.

use std::fmt;
use std::sync::Arc;

use feedwatch_core::transport::{EmailTransport, SmsTransport};
use feedwatch_format::digits::normalize_recipient;
use feedwatch_gate::{BlockReason, Channel, GateDecision, NotificationGate, Recipient, SendMode};
use tracing::{error, info, warn};

use crate::domain::kind::NotificationKind;

/// Static delivery settings.
#[derive(Debug, Clone, Default)]
pub struct NotifierSettings {
    /// SMS sender identity (line number).
    pub sms_sender: String,
    /// Operator phone numbers.
    pub admin_sms_recipients: Vec<String>,
    /// Operator email addresses.
    pub admin_email_recipients: Vec<String>,
    /// Whether operators receive SMS at all.
    pub send_admin_sms: bool,
}

/// Why a delivery was not attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No transport is configured for the channel.
    NoTransport,
    /// No operator recipients are configured.
    NoRecipients,
    /// The user's number normalized to nothing.
    InvalidRecipient,
    /// Operator SMS is switched off.
    AdminSmsDisabled,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoTransport => "no transport configured",
            Self::NoRecipients => "no recipients configured",
            Self::InvalidRecipient => "recipient is empty",
            Self::AdminSmsDisabled => "admin sms disabled",
        })
    }
}

/// Result of one delivery request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The transport accepted the message.
    Sent,
    /// Dry-run mode: the message was logged instead of sent.
    DryRun,
    /// Off mode: nothing was sent.
    Disabled,
    /// The gate refused the send.
    Blocked(BlockReason),
    /// Preconditions were not met; the gate was not consulted.
    Skipped(SkipReason),
    /// The transport reported a failure.
    Failed(String),
}

impl DeliveryOutcome {
    /// Returns `true` if the request got as far as the mode check.
    #[must_use]
    pub fn was_attempted(&self) -> bool {
        !matches!(self, Self::Skipped(_))
    }
}

/// Gate-aware SMS and email delivery.
pub struct Notifier {
    gate: NotificationGate,
    sms: Option<Arc<dyn SmsTransport>>,
    email: Option<Arc<dyn EmailTransport>>,
    settings: NotifierSettings,
}

impl Notifier {
    /// Creates a notifier. A missing transport disables its channel.
    #[must_use]
    pub fn new(
        gate: NotificationGate,
        sms: Option<Arc<dyn SmsTransport>>,
        email: Option<Arc<dyn EmailTransport>>,
        settings: NotifierSettings,
    ) -> Self {
        Self {
            gate,
            sms,
            email,
            settings,
        }
    }

    /// Sends `text` to the account holder at `mobile_number`.
    pub async fn send_user_sms(
        &self,
        kind: NotificationKind,
        mobile_number: &str,
        text: &str,
    ) -> DeliveryOutcome {
        let Some(transport) = &self.sms else {
            warn!(%kind, "user sms skipped: no sms transport configured");
            return DeliveryOutcome::Skipped(SkipReason::NoTransport);
        };
        let Some(recipient) = normalize_recipient(mobile_number) else {
            warn!(%kind, "user sms skipped: invalid mobile number");
            return DeliveryOutcome::Skipped(SkipReason::InvalidRecipient);
        };
        if let Some(outcome) = self.preview(Channel::Sms, &recipient, kind.as_str(), text) {
            return outcome;
        }
        if let GateDecision::Blocked(reason) =
            self.gate.can_send(Channel::Sms, Recipient::User(&recipient))
        {
            warn!(%kind, %recipient, %reason, "user sms blocked");
            return DeliveryOutcome::Blocked(reason);
        }

        let recipients = [recipient];
        match transport
            .send(&recipients, &self.settings.sms_sender, text)
            .await
        {
            Ok(()) => {
                info!(%kind, recipient = %recipients[0], "user sms sent");
                DeliveryOutcome::Sent
            }
            Err(e) => {
                error!(%kind, recipient = %recipients[0], error = %e, "user sms failed");
                DeliveryOutcome::Failed(e.to_string())
            }
        }
    }

    /// Sends `text` to the operator phone numbers.
    pub async fn send_admin_sms(&self, text: &str) -> DeliveryOutcome {
        let kind = NotificationKind::GenericAudit;
        if !self.settings.send_admin_sms {
            return DeliveryOutcome::Skipped(SkipReason::AdminSmsDisabled);
        }
        let Some(transport) = &self.sms else {
            warn!(%kind, "admin sms skipped: no sms transport configured");
            return DeliveryOutcome::Skipped(SkipReason::NoTransport);
        };
        let recipients = &self.settings.admin_sms_recipients;
        if recipients.is_empty() {
            warn!(%kind, "admin sms skipped: no admin recipients configured");
            return DeliveryOutcome::Skipped(SkipReason::NoRecipients);
        }
        let joined = recipients.join(",");
        if let Some(outcome) = self.preview(Channel::Sms, &joined, kind.as_str(), text) {
            return outcome;
        }
        if let GateDecision::Blocked(reason) = self.gate.can_send(Channel::Sms, Recipient::Admin) {
            warn!(%kind, %reason, "admin sms blocked");
            return DeliveryOutcome::Blocked(reason);
        }

        match transport
            .send(recipients, &self.settings.sms_sender, text)
            .await
        {
            Ok(()) => {
                info!(%kind, recipients = %joined, "admin sms sent");
                DeliveryOutcome::Sent
            }
            Err(e) => {
                error!(%kind, recipients = %joined, error = %e, "admin sms failed");
                DeliveryOutcome::Failed(e.to_string())
            }
        }
    }

    /// Sends an email to the operator addresses.
    pub async fn send_admin_email(&self, subject: &str, body: &str) -> DeliveryOutcome {
        let kind = NotificationKind::GenericAudit;
        let Some(transport) = &self.email else {
            warn!(%kind, subject, "email skipped: no email transport configured");
            return DeliveryOutcome::Skipped(SkipReason::NoTransport);
        };
        let recipients = &self.settings.admin_email_recipients;
        if recipients.is_empty() {
            warn!(%kind, subject, "email skipped: no recipients configured");
            return DeliveryOutcome::Skipped(SkipReason::NoRecipients);
        }
        let joined = recipients.join(",");
        if let Some(outcome) = self.preview(Channel::Email, &joined, subject, body) {
            return outcome;
        }
        if let GateDecision::Blocked(reason) =
            self.gate.can_send(Channel::Email, Recipient::Admin)
        {
            warn!(%kind, subject, %reason, "email blocked");
            return DeliveryOutcome::Blocked(reason);
        }

        match transport.send(recipients, subject, body).await {
            Ok(()) => {
                info!(%kind, subject, "email sent");
                DeliveryOutcome::Sent
            }
            Err(e) => {
                error!(%kind, subject, error = %e, "email failed");
                DeliveryOutcome::Failed(e.to_string())
            }
        }
    }

    /// Handles the off and dry-run modes, which never reach the gate.
    fn preview(
        &self,
        channel: Channel,
        recipient: &str,
        label: &str,
        message: &str,
    ) -> Option<DeliveryOutcome> {
        match self.gate.mode(channel) {
            SendMode::Live => None,
            SendMode::Off => {
                info!(%channel, recipient, label, "send skipped: channel is off");
                Some(DeliveryOutcome::Disabled)
            }
            SendMode::DryRun => {
                info!(%channel, recipient, label, message, "dry-run: message not sent");
                Some(DeliveryOutcome::DryRun)
            }
        }
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("gate", &self.gate)
            .field("sms", &self.sms.is_some())
            .field("email", &self.email.is_some())
            .field("settings", &self.settings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use feedwatch_gate::{BlockReason, ChannelPolicy, NotificationGate, SendMode};
    use feedwatch_test_support::{
        FailingSmsTransport, FixedClock, RecordingEmailTransport, RecordingSmsTransport,
    };

    use super::{DeliveryOutcome, Notifier, NotifierSettings, SkipReason};
    use crate::domain::kind::NotificationKind;

    fn policy(mode: SendMode) -> ChannelPolicy {
        ChannelPolicy {
            mode,
            allow_live: true,
            allow_non_production: true,
            ..ChannelPolicy::default()
        }
    }

    fn settings() -> NotifierSettings {
        NotifierSettings {
            sms_sender: "10008663".into(),
            admin_sms_recipients: vec!["09121111111".into(), "09122222222".into()],
            admin_email_recipients: vec!["ops@example.com".into()],
            send_admin_sms: true,
        }
    }

    fn notifier(
        sms_policy: ChannelPolicy,
        sms: &Arc<RecordingSmsTransport>,
        email: &Arc<RecordingEmailTransport>,
    ) -> Notifier {
        let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()));
        let gate = NotificationGate::new(true, sms_policy, policy(SendMode::Live), clock);
        Notifier::new(gate, Some(sms.clone()), Some(email.clone()), settings())
    }

    #[tokio::test]
    async fn test_dry_run_never_invokes_transport() {
        // Arrange
        let sms = Arc::new(RecordingSmsTransport::new());
        let email = Arc::new(RecordingEmailTransport::new());
        let notifier = notifier(policy(SendMode::DryRun), &sms, &email);

        // Act
        let user = notifier
            .send_user_sms(NotificationKind::KycApproved, "09120000000", "hello")
            .await;
        let admin = notifier.send_admin_sms("audit").await;

        // Assert
        assert_eq!(user, DeliveryOutcome::DryRun);
        assert_eq!(admin, DeliveryOutcome::DryRun);
        assert!(sms.sent().is_empty());
    }

    #[tokio::test]
    async fn test_off_mode_sends_nothing() {
        let sms = Arc::new(RecordingSmsTransport::new());
        let email = Arc::new(RecordingEmailTransport::new());
        let notifier = notifier(policy(SendMode::Off), &sms, &email);

        let outcome = notifier
            .send_user_sms(NotificationKind::PasswordChanged, "09120000000", "hello")
            .await;

        assert_eq!(outcome, DeliveryOutcome::Disabled);
        assert!(sms.sent().is_empty());
    }

    #[tokio::test]
    async fn test_live_without_allow_live_never_invokes_transport() {
        let sms = Arc::new(RecordingSmsTransport::new());
        let email = Arc::new(RecordingEmailTransport::new());
        let sms_policy = ChannelPolicy {
            allow_live: false,
            ..policy(SendMode::Live)
        };
        let notifier = notifier(sms_policy, &sms, &email);

        let outcome = notifier
            .send_user_sms(NotificationKind::KycApproved, "09120000000", "hello")
            .await;

        assert_eq!(outcome, DeliveryOutcome::Blocked(BlockReason::LiveNotAllowed));
        assert!(sms.sent().is_empty());
    }

    #[tokio::test]
    async fn test_live_user_sms_goes_to_normalized_number() {
        let sms = Arc::new(RecordingSmsTransport::new());
        let email = Arc::new(RecordingEmailTransport::new());
        let notifier = notifier(policy(SendMode::Live), &sms, &email);

        let outcome = notifier
            .send_user_sms(NotificationKind::KycApproved, " ۰۹۱۲۰۰۰۰۰۰۰ ", "hello")
            .await;

        assert_eq!(outcome, DeliveryOutcome::Sent);
        let sent = sms.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipients, vec!["09120000000".to_owned()]);
        assert_eq!(sent[0].sender, "10008663");
    }

    #[tokio::test]
    async fn test_admin_sms_goes_to_every_operator_in_one_call() {
        let sms = Arc::new(RecordingSmsTransport::new());
        let email = Arc::new(RecordingEmailTransport::new());
        let notifier = notifier(policy(SendMode::Live), &sms, &email);

        assert_eq!(notifier.send_admin_sms("audit").await, DeliveryOutcome::Sent);

        assert_eq!(sms.sent()[0].recipients.len(), 2);
    }

    #[tokio::test]
    async fn test_admin_sms_can_be_switched_off() {
        let sms = Arc::new(RecordingSmsTransport::new());
        let email = Arc::new(RecordingEmailTransport::new());
        let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()));
        let gate = NotificationGate::new(
            true,
            policy(SendMode::Live),
            policy(SendMode::Live),
            clock,
        );
        let notifier = Notifier::new(
            gate,
            Some(sms.clone()),
            Some(email.clone()),
            NotifierSettings {
                send_admin_sms: false,
                ..settings()
            },
        );

        let outcome = notifier.send_admin_sms("audit").await;

        assert_eq!(outcome, DeliveryOutcome::Skipped(SkipReason::AdminSmsDisabled));
        assert!(!outcome.was_attempted());
    }

    #[tokio::test]
    async fn test_provider_failure_is_reported_not_retried() {
        let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()));
        let gate = NotificationGate::new(
            true,
            policy(SendMode::Live),
            policy(SendMode::Live),
            clock,
        );
        let notifier = Notifier::new(gate, Some(Arc::new(FailingSmsTransport)), None, settings());

        let outcome = notifier
            .send_user_sms(NotificationKind::KycApproved, "09120000000", "hello")
            .await;

        assert_eq!(
            outcome,
            DeliveryOutcome::Failed(
                "provider rejected message (code 411): invalid receptor".to_owned()
            )
        );
    }

    #[tokio::test]
    async fn test_email_without_transport_is_skipped() {
        let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()));
        let gate = NotificationGate::new(
            true,
            policy(SendMode::Live),
            policy(SendMode::Live),
            clock,
        );
        let notifier = Notifier::new(gate, None, None, settings());

        assert_eq!(
            notifier.send_admin_email("subject", "body").await,
            DeliveryOutcome::Skipped(SkipReason::NoTransport)
        );
    }

    #[tokio::test]
    async fn test_live_email_is_delivered() {
        let sms = Arc::new(RecordingSmsTransport::new());
        let email = Arc::new(RecordingEmailTransport::new());
        let notifier = notifier(policy(SendMode::Live), &sms, &email);

        let outcome = notifier.send_admin_email("New User — Ali", "body").await;

        assert_eq!(outcome, DeliveryOutcome::Sent);
        assert_eq!(email.sent()[0].to, vec!["ops@example.com".to_owned()]);
    }
}
