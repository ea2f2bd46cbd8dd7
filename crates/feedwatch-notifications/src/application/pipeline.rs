//! Per-stream notification pipeline:
//! classify, enrich, build, gate, send.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::FixedOffset;
use feedwatch_core::account::Account;
use feedwatch_core::clock::Clock;
use feedwatch_core::collection::Collection;
use feedwatch_core::document::Document;
use feedwatch_core::error::DomainError;
use feedwatch_core::event::ChangeEvent;
use feedwatch_core::handler::{EventHandler, HandleOutcome};
use feedwatch_core::repository::{AccountRepository, InstrumentRepository};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::application::audit::AuditComposer;
use crate::application::builder::MessageBuilder;
use crate::application::enrichment::Enricher;
use crate::application::notifier::{DeliveryOutcome, Notifier};
use crate::domain::classify::{AuditEvent, NotificationPlan, classify};
use crate::domain::kind::NotificationKind;
use crate::domain::record::{self, fields};

/// Dependencies shared by the pipelines of every stream.
#[derive(Clone)]
pub struct PipelineContext {
    /// Account lookups and the welcome marker write.
    pub accounts: Arc<dyn AccountRepository>,
    /// Instrument lookups.
    pub instruments: Arc<dyn InstrumentRepository>,
    /// Gate-aware delivery. Shared so the rate limit spans every stream.
    pub notifier: Arc<Notifier>,
    /// Time source for the welcome marker.
    pub clock: Arc<dyn Clock>,
    /// Offset at which dates and times are displayed.
    pub display_offset: FixedOffset,
}

/// Handles the events of one watched collection.
pub struct NotificationPipeline {
    collection: Collection,
    enricher: Enricher,
    builder: MessageBuilder,
    audit: AuditComposer,
    notifier: Arc<Notifier>,
    accounts: Arc<dyn AccountRepository>,
    clock: Arc<dyn Clock>,
}

impl NotificationPipeline {
    /// Creates the pipeline for `collection`.
    #[must_use]
    pub fn new(collection: Collection, context: PipelineContext) -> Self {
        Self {
            collection,
            enricher: Enricher::new(Arc::clone(&context.accounts), context.instruments),
            builder: MessageBuilder::new(context.display_offset),
            audit: AuditComposer::new(context.display_offset),
            notifier: context.notifier,
            accounts: context.accounts,
            clock: context.clock,
        }
    }

    async fn handle_monetary(&self, event: &ChangeEvent, plan: &NotificationPlan) -> usize {
        let mut record = event.full_document.clone();
        let owner = record::owner_id(&record);
        let account = self.enricher.resolve_account(owner.as_deref()).await;

        if self.collection == Collection::Transactions {
            let name = self
                .enricher
                .resolve_instrument_name(record::instrument_id(&record).as_deref())
                .await;
            record.insert(fields::INSTRUMENT_NAME, name);
        }

        let mut attempted = 0;
        if let Some(audit) = plan.audit {
            attempted += self.send_audit(audit, &record, account.as_ref()).await;
        }

        let fresh = if plan.kinds.iter().any(|k| k.reflects_mutation()) {
            match self.enricher.resolve_fresh_account(owner.as_deref()).await {
                Some(fresh) => Some(fresh),
                None => {
                    // Recipient still known from the first read; balances are not.
                    account.as_ref().map(Account::without_balances)
                }
            }
        } else {
            None
        };
        for &kind in &plan.kinds {
            let target = if kind.reflects_mutation() {
                fresh.as_ref()
            } else {
                account.as_ref()
            };
            if self
                .send_user(kind, &record, target)
                .await
                .is_some_and(|o| o.was_attempted())
            {
                attempted += 1;
            }
        }
        attempted
    }

    async fn handle_account(&self, event: &ChangeEvent, plan: &NotificationPlan) -> usize {
        let record = &event.full_document;
        let account_id = record.id().unwrap_or_else(|| event.document_id.clone());
        let account = self.enricher.resolve_account(Some(&account_id)).await;

        let mut attempted = 0;
        if let Some(audit) = plan.audit {
            attempted += self.send_audit(audit, record, account.as_ref()).await;
        }

        for &kind in &plan.kinds {
            if kind == NotificationKind::UserRegistrationWelcome
                && account.as_ref().is_some_and(Account::has_received_welcome)
            {
                info!(%account_id, "welcome already sent; skipping");
                continue;
            }
            let Some(outcome) = self.send_user(kind, record, account.as_ref()).await else {
                continue;
            };
            if outcome.was_attempted() {
                attempted += 1;
            }
            if kind == NotificationKind::UserRegistrationWelcome
                && outcome == DeliveryOutcome::Sent
            {
                self.mark_welcome_sent(&account_id).await;
            }
        }
        attempted
    }

    async fn send_audit(
        &self,
        audit: AuditEvent,
        record: &Document,
        account: Option<&Account>,
    ) -> usize {
        let mut attempted = 0;
        let email = self.audit.admin_email(audit, record, account);
        if self
            .notifier
            .send_admin_email(&email.subject, &email.body)
            .await
            .was_attempted()
        {
            attempted += 1;
        }
        if audit.has_sms()
            && let Some(text) = self.audit.admin_sms(audit, record, account)
            && self.notifier.send_admin_sms(&text).await.was_attempted()
        {
            attempted += 1;
        }
        attempted
    }

    async fn send_user(
        &self,
        kind: NotificationKind,
        record: &Document,
        account: Option<&Account>,
    ) -> Option<DeliveryOutcome> {
        let Some(account) = account else {
            warn!(%kind, "user notification skipped: account not resolved");
            return None;
        };
        let Some(mobile_number) = account.mobile_number.as_deref() else {
            warn!(%kind, account_id = %account.id, "user notification skipped: no mobile number");
            return None;
        };
        let Some(text) = self.builder.build(kind, record, Some(account)) else {
            warn!(%kind, "user notification skipped: no template");
            return None;
        };
        Some(
            self.notifier
                .send_user_sms(kind, mobile_number, &text)
                .await,
        )
    }

    async fn mark_welcome_sent(&self, account_id: &str) {
        match self
            .accounts
            .mark_welcome_sent(account_id, self.clock.now())
            .await
        {
            Ok(true) => info!(account_id, "welcome marker set"),
            Ok(false) => warn!(account_id, "welcome marker was already set"),
            Err(e) => error!(account_id, error = %e, "failed to set welcome marker"),
        }
    }
}

#[async_trait]
impl EventHandler for NotificationPipeline {
    #[instrument(
        skip_all,
        fields(
            stream = %self.collection,
            document_id = %event.document_id,
            resume_token = %event.resume_token,
            correlation_id = %Uuid::new_v4(),
        )
    )]
    async fn handle(&self, event: &ChangeEvent) -> Result<HandleOutcome, DomainError> {
        let plan = classify(self.collection, event);
        if plan.is_inert() {
            debug!(operation = ?event.operation, "event is inert");
            return Ok(HandleOutcome::Inert);
        }
        info!(audit = ?plan.audit, kinds = ?plan.kinds, "handling event");

        let attempted = match self.collection {
            Collection::Users => self.handle_account(event, &plan).await,
            Collection::BalanceTransactions | Collection::Transactions => {
                self.handle_monetary(event, &plan).await
            }
        };
        Ok(HandleOutcome::Handled { attempted })
    }
}
