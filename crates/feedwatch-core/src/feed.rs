//! Change feed abstraction.

use async_trait::async_trait;
use thiserror::Error;

use crate::collection::Collection;
use crate::event::{ChangeEvent, ResumeToken};

/// Where a new subscription starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeFrom {
    /// Continue just after the given token.
    Token(ResumeToken),
    /// Start with the next change made after subscribing.
    Now,
}

/// Failure reported by the change feed.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Connection dropped, timed out or could not be established.
    #[error("feed connection error: {0}")]
    Connection(String),

    /// The resume position is expired or was never valid.
    #[error("resume point no longer available: {0}")]
    ResumePointInvalid(String),

    /// A change record could not be decoded.
    #[error("malformed change event: {0}")]
    Decode(String),
}

impl FeedError {
    /// Returns `true` if retrying from the same checkpoint can never succeed.
    #[must_use]
    pub fn invalidates_checkpoint(&self) -> bool {
        matches!(self, Self::ResumePointInvalid(_))
    }
}

/// Source of insert/update events for the watched collections.
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    /// Opens a subscription to `collection` filtered to inserts and updates.
    async fn subscribe(
        &self,
        collection: Collection,
        from: ResumeFrom,
    ) -> Result<Box<dyn ChangeStream>, FeedError>;
}

/// An open subscription, yielding events in feed order.
#[async_trait]
pub trait ChangeStream: Send {
    /// Waits for the next event. `Ok(None)` means the feed closed the
    /// subscription.
    async fn next_event(&mut self) -> Result<Option<ChangeEvent>, FeedError>;
}
