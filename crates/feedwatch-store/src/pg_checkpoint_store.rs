//! `PostgreSQL` implementation of the `CheckpointStore` trait.

use async_trait::async_trait;
use feedwatch_core::checkpoint::{CheckpointError, CheckpointStore};
use feedwatch_core::event::ResumeToken;
use sqlx::PgPool;

use crate::schema::{DELETE_CHECKPOINT, SELECT_CHECKPOINT, UPSERT_CHECKPOINT};

/// Checkpoints kept in the `stream_checkpoints` table.
#[derive(Debug, Clone)]
pub struct PgCheckpointStore {
    pool: PgPool,
}

impl PgCheckpointStore {
    /// Creates a new `PgCheckpointStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CheckpointStore for PgCheckpointStore {
    async fn load(&self, stream: &str) -> Result<Option<ResumeToken>, CheckpointError> {
        let token: Option<String> = sqlx::query_scalar(SELECT_CHECKPOINT)
            .bind(stream)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(token
            .map(ResumeToken::new)
            .filter(|token| !token.is_empty()))
    }

    async fn save(&self, stream: &str, token: &ResumeToken) -> Result<(), CheckpointError> {
        if token.is_empty() {
            return Ok(());
        }
        sqlx::query(UPSERT_CHECKPOINT)
            .bind(stream)
            .bind(token.as_str())
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    async fn clear(&self, stream: &str) -> Result<(), CheckpointError> {
        sqlx::query(DELETE_CHECKPOINT)
            .bind(stream)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(())
    }
}

#[allow(clippy::needless_pass_by_value)]
fn storage_error(e: sqlx::Error) -> CheckpointError {
    CheckpointError::Storage(e.to_string())
}
