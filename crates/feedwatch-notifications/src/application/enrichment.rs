//! Enrichment resolver: related-record lookups needed for rendering.
//!
//! Lookup failures never escape this module. They are logged and treated as
//! "not found", which degrades the rendered message to placeholders instead
//! of aborting the notification.

use std::sync::Arc;

use feedwatch_core::account::{Account, Instrument};
use feedwatch_core::repository::{AccountRepository, InstrumentRepository};
use tracing::{debug, warn};

/// Instrument name used when the instrument cannot be resolved.
pub const UNKNOWN_INSTRUMENT: &str = "Unknown";

/// Resolves accounts and instruments referenced by monetary records.
#[derive(Clone)]
pub struct Enricher {
    accounts: Arc<dyn AccountRepository>,
    instruments: Arc<dyn InstrumentRepository>,
}

impl Enricher {
    /// Creates a resolver over the given repositories.
    #[must_use]
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        instruments: Arc<dyn InstrumentRepository>,
    ) -> Self {
        Self {
            accounts,
            instruments,
        }
    }

    /// Looks up the account behind `account_ref`.
    pub async fn resolve_account(&self, account_ref: Option<&str>) -> Option<Account> {
        self.lookup_account(account_ref, "account").await
    }

    /// Re-reads the account behind `account_ref` so that balances reflect
    /// the mutation that triggered the notification.
    ///
    /// Always queries the repository; a copy read earlier for the same event
    /// must not be reused.
    pub async fn resolve_fresh_account(&self, account_ref: Option<&str>) -> Option<Account> {
        self.lookup_account(account_ref, "fresh account").await
    }

    /// Display name of the instrument behind `instrument_ref`: its name,
    /// else its symbol, else [`UNKNOWN_INSTRUMENT`].
    pub async fn resolve_instrument_name(&self, instrument_ref: Option<&str>) -> String {
        let Some(instrument_id) = instrument_ref else {
            return UNKNOWN_INSTRUMENT.to_owned();
        };
        let found = match self.instruments.find_instrument(instrument_id).await {
            Ok(found) => found,
            Err(e) => {
                warn!(instrument_id, error = %e, "instrument lookup failed");
                None
            }
        };
        found
            .as_ref()
            .and_then(Instrument::display_name)
            .unwrap_or(UNKNOWN_INSTRUMENT)
            .to_owned()
    }

    async fn lookup_account(&self, account_ref: Option<&str>, what: &str) -> Option<Account> {
        let account_id = account_ref?;
        match self.accounts.find_account(account_id).await {
            Ok(Some(account)) => Some(account),
            Ok(None) => {
                debug!(account_id, what, "account not found");
                None
            }
            Err(e) => {
                warn!(account_id, what, error = %e, "account lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use feedwatch_core::account::{Account, Instrument};
    use feedwatch_test_support::{
        FailingAccountRepository, FailingInstrumentRepository, InMemoryAccountRepository,
        InMemoryInstrumentRepository,
    };

    use super::{Enricher, UNKNOWN_INSTRUMENT};

    fn instruments() -> Arc<InMemoryInstrumentRepository> {
        Arc::new(InMemoryInstrumentRepository::with_instruments([
            Instrument {
                id: "gold".into(),
                name: Some("Gold".into()),
                symbol: Some("XAU".into()),
            },
            Instrument {
                id: "silver".into(),
                name: None,
                symbol: Some("XAG".into()),
            },
        ]))
    }

    #[tokio::test]
    async fn test_resolve_instrument_name_prefers_name_then_symbol() {
        let enricher = Enricher::new(Arc::new(InMemoryAccountRepository::new()), instruments());

        assert_eq!(enricher.resolve_instrument_name(Some("gold")).await, "Gold");
        assert_eq!(enricher.resolve_instrument_name(Some("silver")).await, "XAG");
    }

    #[tokio::test]
    async fn test_resolve_instrument_name_falls_back_when_missing_or_failing() {
        let enricher = Enricher::new(Arc::new(InMemoryAccountRepository::new()), instruments());
        let failing = Enricher::new(
            Arc::new(InMemoryAccountRepository::new()),
            Arc::new(FailingInstrumentRepository),
        );

        assert_eq!(enricher.resolve_instrument_name(None).await, UNKNOWN_INSTRUMENT);
        assert_eq!(
            enricher.resolve_instrument_name(Some("platinum")).await,
            UNKNOWN_INSTRUMENT
        );
        assert_eq!(
            failing.resolve_instrument_name(Some("gold")).await,
            UNKNOWN_INSTRUMENT
        );
    }

    #[tokio::test]
    async fn test_account_lookup_errors_are_absorbed() {
        let enricher = Enricher::new(Arc::new(FailingAccountRepository), instruments());

        assert_eq!(enricher.resolve_account(Some("u-1")).await, None);
        assert_eq!(enricher.resolve_fresh_account(Some("u-1")).await, None);
    }

    #[tokio::test]
    async fn test_fresh_account_is_read_again() {
        // Arrange
        let accounts = Arc::new(InMemoryAccountRepository::with_accounts([Account {
            id: "u-1".into(),
            toman_balance: Some("100".into()),
            ..Account::default()
        }]));
        let enricher = Enricher::new(accounts.clone(), instruments());
        let before = enricher.resolve_account(Some("u-1")).await;
        accounts.put(Account {
            id: "u-1".into(),
            toman_balance: Some("250".into()),
            ..Account::default()
        });

        // Act
        let after = enricher.resolve_fresh_account(Some("u-1")).await;

        // Assert
        assert_eq!(before.unwrap().toman_balance.as_deref(), Some("100"));
        assert_eq!(after.unwrap().toman_balance.as_deref(), Some("250"));
        assert_eq!(accounts.lookups().len(), 2);
    }

    #[tokio::test]
    async fn test_absent_reference_skips_lookup() {
        let accounts = Arc::new(InMemoryAccountRepository::new());
        let enricher = Enricher::new(accounts.clone(), instruments());

        assert_eq!(enricher.resolve_account(None).await, None);
        assert!(accounts.lookups().is_empty());
    }
}
