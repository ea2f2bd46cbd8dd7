//! Stream watcher loop.

use std::sync::Arc;
use std::time::Duration;

use feedwatch_core::checkpoint::CheckpointStore;
use feedwatch_core::collection::Collection;
use feedwatch_core::event::{ChangeEvent, ResumeToken};
use feedwatch_core::feed::{ChangeFeed, FeedError, ResumeFrom};
use feedwatch_core::handler::{EventHandler, HandleOutcome};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Reconnect delay used when none is configured.
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(1500);

/// Watcher tuning.
#[derive(Debug, Clone, Copy)]
pub struct WatcherSettings {
    /// Fixed delay before reopening a failed subscription.
    pub backoff: Duration,
    /// Discard the stored checkpoint once at startup and begin at "now".
    pub start_fresh: bool,
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self {
            backoff: DEFAULT_BACKOFF,
            start_fresh: false,
        }
    }
}

enum StreamEnd {
    Shutdown,
    Closed,
}

/// Watches one collection until shutdown.
pub struct StreamWatcher {
    collection: Collection,
    feed: Arc<dyn ChangeFeed>,
    checkpoints: Arc<dyn CheckpointStore>,
    handler: Arc<dyn EventHandler>,
    settings: WatcherSettings,
}

impl StreamWatcher {
    /// Creates a watcher for `collection`.
    #[must_use]
    pub fn new(
        collection: Collection,
        feed: Arc<dyn ChangeFeed>,
        checkpoints: Arc<dyn CheckpointStore>,
        handler: Arc<dyn EventHandler>,
        settings: WatcherSettings,
    ) -> Self {
        Self {
            collection,
            feed,
            checkpoints,
            handler,
            settings,
        }
    }

    /// Runs until `shutdown` turns `true` (or its sender is dropped).
    ///
    /// Feed errors never end the loop: the watcher logs them, discards the
    /// checkpoint if the feed reports it unusable, waits the fixed backoff
    /// and resubscribes. A checkpoint that cannot be read is discarded and
    /// the stream resumes from now. An event already being handled when shutdown
    /// arrives is finished and checkpointed first.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let stream = self.collection.stream_name();
        info!(stream, backoff_ms = self.settings.backoff.as_millis(), "watcher started");

        if self.settings.start_fresh {
            self.discard_checkpoint("start fresh requested").await;
        }

        let mut last_token: Option<ResumeToken> = None;
        loop {
            match self.watch_once(&mut shutdown, &mut last_token).await {
                Ok(StreamEnd::Shutdown) => break,
                Ok(StreamEnd::Closed) => warn!(stream, "change feed closed the subscription"),
                Err(e) => {
                    error!(stream, error = %e, "change feed error");
                    if e.invalidates_checkpoint() {
                        self.discard_checkpoint("resume point no longer valid").await;
                        last_token = None;
                    }
                }
            }

            tokio::select! {
                () = shutdown_requested(&mut shutdown) => break,
                () = tokio::time::sleep(self.settings.backoff) => {}
            }
            info!(stream, "reconnecting");
        }

        info!(stream, "watcher stopped");
    }

    async fn watch_once(
        &self,
        shutdown: &mut watch::Receiver<bool>,
        last_token: &mut Option<ResumeToken>,
    ) -> Result<StreamEnd, FeedError> {
        let stream = self.collection.stream_name();
        let from = match self.checkpoints.load(stream).await {
            Ok(Some(token)) if !token.is_empty() => ResumeFrom::Token(token),
            Ok(_) => ResumeFrom::Now,
            Err(e) => {
                error!(stream, error = %e, "could not read checkpoint");
                self.discard_checkpoint("checkpoint unreadable").await;
                *last_token = None;
                ResumeFrom::Now
            }
        };
        info!(stream, resume_from = ?from, "opening subscription");
        let mut subscription = self.feed.subscribe(self.collection, from).await?;

        loop {
            let next = tokio::select! {
                biased;
                () = shutdown_requested(shutdown) => return Ok(StreamEnd::Shutdown),
                next = subscription.next_event() => next?,
            };
            let Some(event) = next else {
                return Ok(StreamEnd::Closed);
            };
            self.process(&event, last_token).await;
        }
    }

    async fn process(&self, event: &ChangeEvent, last_token: &mut Option<ResumeToken>) {
        let stream = self.collection.stream_name();
        if last_token.as_ref() == Some(&event.resume_token) {
            debug!(stream, resume_token = %event.resume_token, "event already handled; skipping");
            return;
        }

        match self.handler.handle(event).await {
            Ok(HandleOutcome::Inert) => {
                debug!(stream, document_id = %event.document_id, "inert event");
            }
            Ok(HandleOutcome::Handled { attempted }) => {
                info!(stream, document_id = %event.document_id, attempted, "event handled");
            }
            Err(e) => {
                error!(stream, document_id = %event.document_id, error = %e, "event handler failed");
            }
        }

        if let Err(e) = self.checkpoints.save(stream, &event.resume_token).await {
            error!(stream, resume_token = %event.resume_token, error = %e, "failed to save checkpoint");
        }
        *last_token = Some(event.resume_token.clone());
    }

    async fn discard_checkpoint(&self, reason: &str) {
        let stream = self.collection.stream_name();
        match self.checkpoints.clear(stream).await {
            Ok(()) => warn!(stream, reason, "checkpoint cleared; resuming from now"),
            Err(e) => error!(stream, reason, error = %e, "failed to clear checkpoint"),
        }
    }
}

/// Resolves once shutdown is signalled or the sender is gone.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
