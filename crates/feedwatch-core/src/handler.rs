//! Per-event handler abstraction driven by the stream watcher.

use async_trait::async_trait;

use crate::error::DomainError;
use crate::event::ChangeEvent;

/// What a handler did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOutcome {
    /// The event is not relevant to any notification.
    Inert,
    /// The event was classified and `attempted` deliveries were tried.
    Handled {
        /// Number of outbound deliveries attempted (sent, previewed or blocked).
        attempted: usize,
    },
}

/// Processes one change event. Implementations absorb their own delivery
/// failures; an `Err` is logged by the caller and the event is still
/// checkpointed.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handles `event`.
    async fn handle(&self, event: &ChangeEvent) -> Result<HandleOutcome, DomainError>;
}
