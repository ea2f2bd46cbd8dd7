//! `PostgreSQL` implementation of the `AccountRepository` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use feedwatch_core::account::Account;
use feedwatch_core::document::Document;
use feedwatch_core::error::DomainError;
use feedwatch_core::repository::AccountRepository;
use serde_json::Value;
use sqlx::PgPool;

use crate::schema::{MARK_WELCOME_SENT, SELECT_USER};
use crate::with_row_id;

/// Account lookups against the `users` table.
#[derive(Debug, Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    /// Creates a new `PgAccountRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn find_account(&self, account_id: &str) -> Result<Option<Account>, DomainError> {
        let document: Option<Value> = sqlx::query_scalar(SELECT_USER)
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::Infrastructure(e.to_string()))?;
        Ok(document
            .map(|value| with_row_id(Document::from_value(value), account_id))
            .as_ref()
            .and_then(Account::from_document))
    }

    async fn mark_welcome_sent(
        &self,
        account_id: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(MARK_WELCOME_SENT)
            .bind(account_id)
            .bind(sent_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Infrastructure(e.to_string()))?;
        Ok(result.rows_affected() == 1)
    }
}
