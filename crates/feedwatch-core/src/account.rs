//! Read-only projections of records used during enrichment.

use crate::document::Document;

/// Field names on user account records.
pub mod fields {
    /// Given name.
    pub const FIRST_NAME: &str = "firstName";
    /// Family name.
    pub const LAST_NAME: &str = "lastName";
    /// Mobile number used as the SMS recipient.
    pub const MOBILE_NUMBER: &str = "mobileNumber";
    /// KYC verification status code.
    pub const VERIFICATION_STATUS: &str = "verificationStatus";
    /// Reviewer note attached to a KYC decision.
    pub const VERIFY_DESCRIPTION: &str = "verifyDescription";
    /// Currency wallet balance.
    pub const TOMAN_BALANCE: &str = "tomanBalance";
    /// Gold holding.
    pub const GOLD_BALANCE: &str = "goldBalance";
    /// Silver holding.
    pub const SILVER_BALANCE: &str = "silverBalance";
    /// Set once the welcome notification has been delivered.
    pub const WELCOME_SENT_AT: &str = "welcomeSmsSentAt";
}

/// A user account as seen by the dispatcher.
///
/// Balances are kept as the raw text stored on the record so they can be
/// rendered without rounding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Account {
    /// Account identifier.
    pub id: String,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Mobile number, as stored.
    pub mobile_number: Option<String>,
    /// KYC verification status code.
    pub verification_status: Option<String>,
    /// Reviewer note attached to the last KYC decision.
    pub verify_description: Option<String>,
    /// Currency wallet balance.
    pub toman_balance: Option<String>,
    /// Gold holding.
    pub gold_balance: Option<String>,
    /// Silver holding.
    pub silver_balance: Option<String>,
    /// When the welcome notification was delivered, if ever.
    pub welcome_sent_at: Option<String>,
}

impl Account {
    /// Projects an account from a user record. Returns `None` if the record
    /// has no identifier.
    #[must_use]
    pub fn from_document(doc: &Document) -> Option<Self> {
        Some(Self {
            id: doc.id()?,
            first_name: doc.text(fields::FIRST_NAME),
            last_name: doc.text(fields::LAST_NAME),
            mobile_number: doc.text(fields::MOBILE_NUMBER),
            verification_status: doc.text(fields::VERIFICATION_STATUS),
            verify_description: doc.text(fields::VERIFY_DESCRIPTION),
            toman_balance: doc.text(fields::TOMAN_BALANCE),
            gold_balance: doc.text(fields::GOLD_BALANCE),
            silver_balance: doc.text(fields::SILVER_BALANCE),
            welcome_sent_at: doc.text(fields::WELCOME_SENT_AT),
        })
    }

    /// Copy of the account with every balance unknown.
    #[must_use]
    pub fn without_balances(&self) -> Self {
        Self {
            toman_balance: None,
            gold_balance: None,
            silver_balance: None,
            ..self.clone()
        }
    }

    /// Returns `true` once the welcome marker is set.
    #[must_use]
    pub fn has_received_welcome(&self) -> bool {
        self.welcome_sent_at.is_some()
    }
}

/// A tradeable instrument (gold, silver, tether, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Instrument {
    /// Instrument identifier.
    pub id: String,
    /// Display name.
    pub name: Option<String>,
    /// Ticker-style symbol.
    pub symbol: Option<String>,
}

impl Instrument {
    /// Projects an instrument from a tradeable record.
    #[must_use]
    pub fn from_document(doc: &Document) -> Option<Self> {
        Some(Self {
            id: doc.id()?,
            name: doc.text("name"),
            symbol: doc.text("symbol"),
        })
    }

    /// Name if present, otherwise symbol.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().or(self.symbol.as_deref())
    }
}
