//! Wires configuration into running stream watchers.

use std::sync::Arc;

use feedwatch_core::checkpoint::CheckpointStore;
use feedwatch_core::clock::{Clock, SystemClock};
use feedwatch_core::collection::Collection;
use feedwatch_core::feed::ChangeFeed;
use feedwatch_core::transport::{EmailTransport, SmsTransport};
use feedwatch_gate::NotificationGate;
use feedwatch_notifications::application::notifier::{Notifier, NotifierSettings};
use feedwatch_notifications::application::pipeline::{NotificationPipeline, PipelineContext};
use feedwatch_store::file_checkpoint_store::FileCheckpointStore;
use feedwatch_store::pg_account_repository::PgAccountRepository;
use feedwatch_store::pg_change_feed::PgChangeFeed;
use feedwatch_store::pg_checkpoint_store::PgCheckpointStore;
use feedwatch_store::pg_instrument_repository::PgInstrumentRepository;
use feedwatch_watcher::{StreamWatcher, WatcherSettings};
use sqlx::PgPool;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::{CheckpointBackend, DispatcherConfig};
use crate::error::AppError;
use crate::transport::kavenegar::KavenegarSmsTransport;
use crate::transport::smtp::SmtpEmailTransport;

/// Everything the stream watchers share.
#[derive(Clone)]
pub struct Dispatcher {
    feed: Arc<dyn ChangeFeed>,
    checkpoints: Arc<dyn CheckpointStore>,
    context: PipelineContext,
    settings: WatcherSettings,
}

impl Dispatcher {
    /// Assembles a dispatcher from its parts.
    #[must_use]
    pub fn new(
        feed: Arc<dyn ChangeFeed>,
        checkpoints: Arc<dyn CheckpointStore>,
        context: PipelineContext,
        settings: WatcherSettings,
    ) -> Self {
        Self {
            feed,
            checkpoints,
            context,
            settings,
        }
    }

    /// Builds the production dispatcher on top of `pool`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` if a configured transport cannot be
    /// constructed.
    pub fn from_config(config: &DispatcherConfig, pool: PgPool) -> Result<Self, AppError> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let notifier = build_notifier(config, Arc::clone(&clock))?;

        let checkpoints: Arc<dyn CheckpointStore> = match &config.checkpoint_backend {
            CheckpointBackend::Postgres => Arc::new(PgCheckpointStore::new(pool.clone())),
            CheckpointBackend::File(dir) => Arc::new(FileCheckpointStore::new(dir.clone())),
        };
        let context = PipelineContext {
            accounts: Arc::new(PgAccountRepository::new(pool.clone())),
            instruments: Arc::new(PgInstrumentRepository::new(pool.clone())),
            notifier: Arc::new(notifier),
            clock,
            display_offset: config.display_offset,
        };

        Ok(Self::new(
            Arc::new(PgChangeFeed::new(pool)),
            checkpoints,
            context,
            WatcherSettings {
                backoff: config.watch_backoff,
                start_fresh: config.watch_start_fresh,
            },
        ))
    }

    /// Starts one watcher task per collection.
    #[must_use]
    pub fn spawn(
        &self,
        collections: &[Collection],
        shutdown: &watch::Receiver<bool>,
    ) -> Vec<JoinHandle<()>> {
        collections
            .iter()
            .map(|&collection| {
                let watcher = StreamWatcher::new(
                    collection,
                    Arc::clone(&self.feed),
                    Arc::clone(&self.checkpoints),
                    Arc::new(NotificationPipeline::new(collection, self.context.clone())),
                    self.settings,
                );
                let shutdown = shutdown.clone();
                tokio::spawn(async move { watcher.run(shutdown).await })
            })
            .collect()
    }

    /// Runs watchers for `collections` until `shutdown` fires and every
    /// watcher has stopped.
    pub async fn run(&self, collections: &[Collection], shutdown: watch::Receiver<bool>) {
        let handles = self.spawn(collections, &shutdown);
        info!(watchers = handles.len(), "dispatcher running");
        join_all(handles).await;
        info!("dispatcher stopped");
    }
}

/// Waits for every watcher task, logging any that panicked.
pub async fn join_all(handles: Vec<JoinHandle<()>>) {
    for handle in handles {
        if let Err(e) = handle.await {
            error!(error = %e, "watcher task failed");
        }
    }
}

/// Builds the gate and transports described by `config`.
///
/// A channel without provider configuration gets no transport, so its
/// messages are skipped rather than failing.
///
/// # Errors
///
/// Returns `AppError::Transport` if a configured transport cannot be
/// constructed.
pub fn build_notifier(config: &DispatcherConfig, clock: Arc<dyn Clock>) -> Result<Notifier, AppError> {
    let gate = NotificationGate::new(
        config.production,
        config.sms.clone(),
        config.email.clone(),
        clock,
    );

    let sms: Option<Arc<dyn SmsTransport>> = match &config.kavenegar {
        Some(kavenegar) => Some(Arc::new(KavenegarSmsTransport::new(
            &kavenegar.api_key,
            &kavenegar.base_url,
        )?)),
        None => {
            warn!("KAVENEGAR_API_KEY not set; sms disabled");
            None
        }
    };
    let email: Option<Arc<dyn EmailTransport>> = match &config.smtp {
        Some(smtp) => Some(Arc::new(SmtpEmailTransport::new(smtp)?)),
        None => {
            warn!("SMTP_HOST/SMTP_USER/SMTP_PASS not set; email disabled");
            None
        }
    };

    info!(
        production = config.production,
        sms_mode = %config.sms.mode,
        email_mode = %config.email.mode,
        sms_rate_limit = config.sms.max_per_minute,
        sms_allowlist = config.sms.allowlist.len(),
        send_admin_sms = config.send_admin_sms,
        "notification gate configured"
    );

    Ok(Notifier::new(
        gate,
        sms,
        email,
        NotifierSettings {
            sms_sender: config.sms_sender.clone(),
            admin_sms_recipients: config.admin_sms_recipients.clone(),
            admin_email_recipients: config.alert_to.clone(),
            send_admin_sms: config.send_admin_sms,
        },
    ))
}

#[cfg(test)]
mod tests {
    use sqlx::postgres::PgPoolOptions;

    use super::Dispatcher;
    use crate::config::DispatcherConfig;

    #[tokio::test]
    async fn test_from_config_builds_with_every_channel_configured() {
        // Arrange
        let vars = [
            ("DATABASE_URL", "postgres://localhost/feedwatch"),
            ("KAVENEGAR_API_KEY", "key"),
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_USER", "mailer"),
            ("SMTP_PASS", "secret"),
            ("CHECKPOINT_BACKEND", "file"),
            ("CHECKPOINT_DIR", "/tmp/feedwatch"),
        ];
        let config = DispatcherConfig::from_lookup(|name| {
            vars.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| (*v).to_owned())
        })
        .unwrap();
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();

        // Act
        let dispatcher = Dispatcher::from_config(&config, pool);

        // Assert
        assert!(dispatcher.is_ok());
    }
}
