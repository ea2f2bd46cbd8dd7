//! In-memory `CheckpointStore` for tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use feedwatch_core::checkpoint::{CheckpointError, CheckpointStore};
use feedwatch_core::event::ResumeToken;

/// A checkpoint store backed by a map, recording every save and clear.
#[derive(Debug, Default)]
pub struct InMemoryCheckpointStore {
    tokens: Mutex<HashMap<String, ResumeToken>>,
    saves: Mutex<Vec<(String, ResumeToken)>>,
    clears: Mutex<Vec<String>>,
    unreadable: Mutex<HashSet<String>>,
}

impl InMemoryCheckpointStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store already holding `token` for `stream`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_token(stream: &str, token: &str) -> Self {
        let store = Self::default();
        store
            .tokens
            .lock()
            .unwrap()
            .insert(stream.to_owned(), ResumeToken::new(token));
        store
    }

    /// Makes loads of `stream` fail until it is cleared or saved.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_unreadable(self, stream: &str) -> Self {
        self.unreadable.lock().unwrap().insert(stream.to_owned());
        self
    }

    /// Returns the token currently stored for `stream`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn current(&self, stream: &str) -> Option<ResumeToken> {
        self.tokens.lock().unwrap().get(stream).cloned()
    }

    /// Returns every non-empty save, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn saves(&self) -> Vec<(String, ResumeToken)> {
        self.saves.lock().unwrap().clone()
    }

    /// Returns the stream names that were cleared, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn clears(&self) -> Vec<String> {
        self.clears.lock().unwrap().clone()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn load(&self, stream: &str) -> Result<Option<ResumeToken>, CheckpointError> {
        if self.unreadable.lock().unwrap().contains(stream) {
            return Err(CheckpointError::Storage(format!(
                "checkpoint for {stream} is unreadable"
            )));
        }
        Ok(self.current(stream))
    }

    async fn save(&self, stream: &str, token: &ResumeToken) -> Result<(), CheckpointError> {
        if token.is_empty() {
            return Ok(());
        }
        self.unreadable.lock().unwrap().remove(stream);
        self.tokens
            .lock()
            .unwrap()
            .insert(stream.to_owned(), token.clone());
        self.saves
            .lock()
            .unwrap()
            .push((stream.to_owned(), token.clone()));
        Ok(())
    }

    async fn clear(&self, stream: &str) -> Result<(), CheckpointError> {
        self.tokens.lock().unwrap().remove(stream);
        self.unreadable.lock().unwrap().remove(stream);
        self.clears.lock().unwrap().push(stream.to_owned());
        Ok(())
    }
}
