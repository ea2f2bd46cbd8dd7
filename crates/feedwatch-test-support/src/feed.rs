//! Scripted `ChangeFeed` for driving the watcher in tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use feedwatch_core::collection::Collection;
use feedwatch_core::event::ChangeEvent;
use feedwatch_core::feed::{ChangeFeed, ChangeStream, FeedError, ResumeFrom};
use tokio::sync::Notify;

#[derive(Debug)]
enum Subscription {
    Stream(VecDeque<Result<ChangeEvent, FeedError>>),
    Refuse(FeedError),
}

/// A change feed that replays one queued script per `subscribe` call.
///
/// Each script is either a refusal (the subscribe call fails) or a sequence
/// of events and errors yielded in order. A stream whose script is used up
/// parks forever and signals [`ScriptedChangeFeed::wait_until_idle`]. Once
/// every script is consumed, further subscriptions park immediately.
#[derive(Debug, Default)]
pub struct ScriptedChangeFeed {
    scripts: Mutex<VecDeque<Subscription>>,
    subscriptions: Mutex<Vec<(Collection, ResumeFrom)>>,
    idle: Arc<Notify>,
}

impl ScriptedChangeFeed {
    /// Creates a feed with no scripts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a subscription yielding `events`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn then_events(self, events: impl IntoIterator<Item = ChangeEvent>) -> Self {
        self.then_stream(events.into_iter().map(Ok))
    }

    /// Queues a subscription yielding `items`, errors included.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn then_stream(
        self,
        items: impl IntoIterator<Item = Result<ChangeEvent, FeedError>>,
    ) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .push_back(Subscription::Stream(items.into_iter().collect()));
        self
    }

    /// Queues a subscribe call that fails with `error`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn then_refuse(self, error: FeedError) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .push_back(Subscription::Refuse(error));
        self
    }

    /// Returns every `subscribe` call made, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn subscriptions(&self) -> Vec<(Collection, ResumeFrom)> {
        self.subscriptions.lock().unwrap().clone()
    }

    /// Waits until a subscriber has consumed its whole script.
    pub async fn wait_until_idle(&self) {
        self.idle.notified().await;
    }
}

#[async_trait]
impl ChangeFeed for ScriptedChangeFeed {
    async fn subscribe(
        &self,
        collection: Collection,
        from: ResumeFrom,
    ) -> Result<Box<dyn ChangeStream>, FeedError> {
        self.subscriptions.lock().unwrap().push((collection, from));
        let script = self.scripts.lock().unwrap().pop_front();
        match script {
            Some(Subscription::Refuse(error)) => Err(error),
            Some(Subscription::Stream(items)) => Ok(Box::new(ScriptedStream {
                items,
                idle: Arc::clone(&self.idle),
            })),
            None => Ok(Box::new(ScriptedStream {
                items: VecDeque::new(),
                idle: Arc::clone(&self.idle),
            })),
        }
    }
}

struct ScriptedStream {
    items: VecDeque<Result<ChangeEvent, FeedError>>,
    idle: Arc<Notify>,
}

#[async_trait]
impl ChangeStream for ScriptedStream {
    async fn next_event(&mut self) -> Result<Option<ChangeEvent>, FeedError> {
        if let Some(item) = self.items.pop_front() {
            return item.map(Some);
        }
        self.idle.notify_one();
        std::future::pending().await
    }
}
