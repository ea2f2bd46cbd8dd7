//! Test repositories — mock account and instrument repositories for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use feedwatch_core::account::{Account, Instrument};
use feedwatch_core::error::DomainError;
use feedwatch_core::repository::{AccountRepository, InstrumentRepository};

/// An account repository backed by a map. Counts lookups and applies the
/// welcome marker compare-and-set against the stored account.
#[derive(Debug, Default)]
pub struct InMemoryAccountRepository {
    accounts: Mutex<HashMap<String, Account>>,
    lookups: Mutex<Vec<String>>,
    failing_from: Mutex<Option<usize>>,
}

impl InMemoryAccountRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository holding `accounts`.
    #[must_use]
    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let repo = Self::default();
        for account in accounts {
            repo.put(account);
        }
        repo
    }

    /// Inserts or replaces an account.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn put(&self, account: Account) {
        self.accounts
            .lock()
            .unwrap()
            .insert(account.id.clone(), account);
    }

    /// Returns the stored account.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn get(&self, account_id: &str) -> Option<Account> {
        self.accounts.lock().unwrap().get(account_id).cloned()
    }

    /// Makes the `nth` lookup (counting from 1) and every later one fail
    /// with an infrastructure error.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn fail_lookups_from(&self, nth: usize) {
        *self.failing_from.lock().unwrap() = Some(nth);
    }

    /// Returns every id passed to `find_account`, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn find_account(&self, account_id: &str) -> Result<Option<Account>, DomainError> {
        let attempt = {
            let mut lookups = self.lookups.lock().unwrap();
            lookups.push(account_id.to_owned());
            lookups.len()
        };
        if self
            .failing_from
            .lock()
            .unwrap()
            .is_some_and(|nth| attempt >= nth)
        {
            return Err(DomainError::Infrastructure("connection reset".into()));
        }
        Ok(self.get(account_id))
    }

    async fn mark_welcome_sent(
        &self,
        account_id: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let mut accounts = self.accounts.lock().unwrap();
        match accounts.get_mut(account_id) {
            Some(account) if account.welcome_sent_at.is_none() => {
                account.welcome_sent_at = Some(sent_at.to_rfc3339());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// An account repository that always returns an infrastructure error.
#[derive(Debug)]
pub struct FailingAccountRepository;

#[async_trait]
impl AccountRepository for FailingAccountRepository {
    async fn find_account(&self, _account_id: &str) -> Result<Option<Account>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn mark_welcome_sent(
        &self,
        _account_id: &str,
        _sent_at: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}

/// An instrument repository backed by a map.
#[derive(Debug, Default)]
pub struct InMemoryInstrumentRepository {
    instruments: HashMap<String, Instrument>,
}

impl InMemoryInstrumentRepository {
    /// Creates a repository holding `instruments`.
    #[must_use]
    pub fn with_instruments(instruments: impl IntoIterator<Item = Instrument>) -> Self {
        Self {
            instruments: instruments
                .into_iter()
                .map(|i| (i.id.clone(), i))
                .collect(),
        }
    }
}

#[async_trait]
impl InstrumentRepository for InMemoryInstrumentRepository {
    async fn find_instrument(
        &self,
        instrument_id: &str,
    ) -> Result<Option<Instrument>, DomainError> {
        Ok(self.instruments.get(instrument_id).cloned())
    }
}

/// An instrument repository that always returns an infrastructure error.
#[derive(Debug)]
pub struct FailingInstrumentRepository;

#[async_trait]
impl InstrumentRepository for FailingInstrumentRepository {
    async fn find_instrument(
        &self,
        _instrument_id: &str,
    ) -> Result<Option<Instrument>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}
