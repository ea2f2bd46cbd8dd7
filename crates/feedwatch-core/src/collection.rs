//! The watched collections.

use std::fmt;

/// A collection whose change feed is watched.
///
/// Each collection owns an independent subscription, checkpoint and
/// reconnect timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Deposits and withdrawals against the currency wallet.
    BalanceTransactions,
    /// User accounts.
    Users,
    /// Buy/sell trades of gold, silver and other instruments.
    Transactions,
}

impl Collection {
    /// Every watched collection, in startup order.
    pub const ALL: [Self; 3] = [Self::BalanceTransactions, Self::Users, Self::Transactions];

    /// Name under which the stream's checkpoint is stored.
    #[must_use]
    pub fn stream_name(self) -> &'static str {
        match self {
            Self::BalanceTransactions => "tx",
            Self::Users => "users",
            Self::Transactions => "transactions",
        }
    }

    /// Backing table name.
    #[must_use]
    pub fn table_name(self) -> &'static str {
        match self {
            Self::BalanceTransactions => "balance_transactions",
            Self::Users => "users",
            Self::Transactions => "transactions",
        }
    }

    /// Resolves a collection from its backing table name.
    #[must_use]
    pub fn from_table_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.table_name() == name)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stream_name())
    }
}

#[cfg(test)]
mod tests {
    use super::Collection;

    #[test]
    fn test_stream_names_are_distinct() {
        let names: std::collections::HashSet<_> =
            Collection::ALL.iter().map(|c| c.stream_name()).collect();
        assert_eq!(names.len(), 3);
    }

    #[test]
    fn test_from_table_name_round_trips_every_collection() {
        for collection in Collection::ALL {
            assert_eq!(
                Collection::from_table_name(collection.table_name()),
                Some(collection)
            );
        }
        assert_eq!(Collection::from_table_name("tradeables"), None);
    }
}
