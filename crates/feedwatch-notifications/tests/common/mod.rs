//! Shared test helpers for pipeline integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use chrono::{FixedOffset, TimeZone, Utc};
use feedwatch_core::account::{Account, Instrument};
use feedwatch_core::clock::Clock;
use feedwatch_core::collection::Collection;
use feedwatch_core::document::Document;
use feedwatch_core::event::{ChangeEvent, ResumeToken};
use feedwatch_gate::{ChannelPolicy, NotificationGate, SendMode};
use feedwatch_notifications::application::notifier::{Notifier, NotifierSettings};
use feedwatch_notifications::application::pipeline::{NotificationPipeline, PipelineContext};
use feedwatch_test_support::{
    FixedClock, InMemoryAccountRepository, InMemoryInstrumentRepository, RecordingEmailTransport,
    RecordingSmsTransport,
};
use serde_json::Value;

/// Admin phone number configured in every harness.
pub const ADMIN_NUMBER: &str = "09121111111";

/// A pipeline wired to in-memory repositories and recording transports.
pub struct Harness {
    pub accounts: Arc<InMemoryAccountRepository>,
    pub sms: Arc<RecordingSmsTransport>,
    pub email: Arc<RecordingEmailTransport>,
    context: PipelineContext,
}

impl Harness {
    /// Builds a harness with both channels live and unrestricted.
    pub fn live(accounts: impl IntoIterator<Item = Account>) -> Self {
        Self::with_sms_mode(SendMode::Live, accounts)
    }

    /// Builds a harness whose SMS channel runs in `mode`.
    pub fn with_sms_mode(mode: SendMode, accounts: impl IntoIterator<Item = Account>) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
        ));
        let open = |mode| ChannelPolicy {
            mode,
            allow_live: true,
            allow_non_production: true,
            ..ChannelPolicy::default()
        };
        let gate = NotificationGate::new(true, open(mode), open(SendMode::Live), Arc::clone(&clock));

        let accounts = Arc::new(InMemoryAccountRepository::with_accounts(accounts));
        let sms = Arc::new(RecordingSmsTransport::new());
        let email = Arc::new(RecordingEmailTransport::new());
        let notifier = Notifier::new(
            gate,
            Some(sms.clone()),
            Some(email.clone()),
            NotifierSettings {
                sms_sender: "10008663".into(),
                admin_sms_recipients: vec![ADMIN_NUMBER.into()],
                admin_email_recipients: vec!["ops@example.com".into()],
                send_admin_sms: true,
            },
        );
        let instruments = Arc::new(InMemoryInstrumentRepository::with_instruments([
            Instrument {
                id: "tr-gold".into(),
                name: Some("Gold".into()),
                symbol: Some("XAU".into()),
            },
        ]));

        let context = PipelineContext {
            accounts: accounts.clone(),
            instruments,
            notifier: Arc::new(notifier),
            clock,
            display_offset: FixedOffset::east_opt(210 * 60).unwrap(),
        };
        Self {
            accounts,
            sms,
            email,
            context,
        }
    }

    /// Builds the pipeline for `collection`.
    pub fn pipeline(&self, collection: Collection) -> NotificationPipeline {
        NotificationPipeline::new(collection, self.context.clone())
    }

    /// SMS texts sent to `number`.
    pub fn sms_to(&self, number: &str) -> Vec<String> {
        self.sms
            .sent()
            .into_iter()
            .filter(|s| s.recipients.iter().any(|r| r == number))
            .map(|s| s.text)
            .collect()
    }
}

/// An account with a name, a mobile number and balances.
pub fn account(id: &str, mobile: &str) -> Account {
    Account {
        id: id.into(),
        first_name: Some("Sara".into()),
        last_name: Some("Karimi".into()),
        mobile_number: Some(mobile.into()),
        toman_balance: Some("12500000".into()),
        gold_balance: Some("3.25".into()),
        silver_balance: Some("1200".into()),
        ..Account::default()
    }
}

/// An insert event carrying `doc`.
pub fn insert(id: &str, doc: Value, token: &str) -> ChangeEvent {
    ChangeEvent::insert(id, Document::from_value(doc), ResumeToken::new(token))
}

/// An update event setting `updated` on a record now equal to `doc`.
pub fn update(id: &str, doc: Value, updated: Value, token: &str) -> ChangeEvent {
    ChangeEvent::update(
        id,
        Document::from_value(doc),
        Document::from_value(updated),
        Vec::new(),
        ResumeToken::new(token),
    )
}
