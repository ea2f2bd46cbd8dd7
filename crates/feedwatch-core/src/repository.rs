//! Record lookup abstractions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::account::{Account, Instrument};
use crate::error::DomainError;

/// Point lookups and the single permitted write against user accounts.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Loads the current state of an account. `Ok(None)` if it does not exist.
    async fn find_account(&self, account_id: &str) -> Result<Option<Account>, DomainError>;

    /// Sets the welcome marker if, and only if, it is not already set.
    ///
    /// Returns `true` if this call set the marker.
    async fn mark_welcome_sent(
        &self,
        account_id: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<bool, DomainError>;
}

/// Point lookups against tradeable instruments.
#[async_trait]
pub trait InstrumentRepository: Send + Sync {
    /// Loads an instrument. `Ok(None)` if it does not exist.
    async fn find_instrument(&self, instrument_id: &str)
    -> Result<Option<Instrument>, DomainError>;
}
