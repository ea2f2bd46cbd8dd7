//! Resume checkpoint persistence abstraction.

use async_trait::async_trait;
use thiserror::Error;

use crate::event::ResumeToken;

/// Failure while reading or writing a checkpoint.
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// File system failure.
    #[error("checkpoint i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Backing store failure.
    #[error("checkpoint storage error: {0}")]
    Storage(String),
}

/// Durable per-stream cursor storage.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Loads the last saved token for `stream`.
    ///
    /// A missing or unparsable checkpoint loads as `Ok(None)`; corruption is
    /// never reported as an error.
    async fn load(&self, stream: &str) -> Result<Option<ResumeToken>, CheckpointError>;

    /// Saves `token` for `stream`. An empty token is ignored so that a valid
    /// checkpoint is never overwritten with nothing.
    async fn save(&self, stream: &str, token: &ResumeToken) -> Result<(), CheckpointError>;

    /// Deletes the checkpoint for `stream`, if any.
    async fn clear(&self, stream: &str) -> Result<(), CheckpointError>;
}
