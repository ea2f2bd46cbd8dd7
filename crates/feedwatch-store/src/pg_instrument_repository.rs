//! `PostgreSQL` implementation of the `InstrumentRepository` trait.

use async_trait::async_trait;
use feedwatch_core::account::Instrument;
use feedwatch_core::document::Document;
use feedwatch_core::error::DomainError;
use feedwatch_core::repository::InstrumentRepository;
use serde_json::Value;
use sqlx::PgPool;

use crate::schema::SELECT_TRADEABLE;
use crate::with_row_id;

/// Instrument lookups against the `tradeables` table.
#[derive(Debug, Clone)]
pub struct PgInstrumentRepository {
    pool: PgPool,
}

impl PgInstrumentRepository {
    /// Creates a new `PgInstrumentRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InstrumentRepository for PgInstrumentRepository {
    async fn find_instrument(
        &self,
        instrument_id: &str,
    ) -> Result<Option<Instrument>, DomainError> {
        let document: Option<Value> = sqlx::query_scalar(SELECT_TRADEABLE)
            .bind(instrument_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::Infrastructure(e.to_string()))?;
        Ok(document
            .map(|value| with_row_id(Document::from_value(value), instrument_id))
            .as_ref()
            .and_then(Instrument::from_document))
    }
}
