//! Field vocabulary of monetary records (balance transactions and trades).
//!
//! Writers disagree on field names, so amounts are read through ordered
//! alias lists with [`Document::pick_first_present`].

use feedwatch_core::document::Document;

/// Field names on balance transaction and trade records.
pub mod fields {
    /// Type code (deposit, withdraw, buy, sell, ...).
    pub const TYPE: &str = "type";
    /// Status code.
    pub const STATUS: &str = "status";
    /// Owning account reference.
    pub const OWNER: &str = "user";
    /// Traded instrument reference.
    pub const INSTRUMENT: &str = "tradeable";
    /// Instrument display name, set during enrichment.
    pub const INSTRUMENT_NAME: &str = "tradeableName";
    /// Raw amount field.
    pub const AMOUNT: &str = "amount";
    /// Fee charged.
    pub const WAGE: &str = "wage";
    /// Raw total field.
    pub const TOTAL: &str = "total";
    /// Unit price of the instrument at trade time.
    pub const INSTRUMENT_PRICE: &str = "tradeablePrice";
    /// Reviewer note attached to an approval or rejection.
    pub const CONFIRM_DESCRIPTION: &str = "confirmDescription";
    /// Payout tracking code.
    pub const TRACKING_CODE: &str = "trackingCode";
    /// Creation time.
    pub const CREATED_AT: &str = "createdAt";
    /// Last modification time.
    pub const UPDATED_AT: &str = "updatedAt";
    /// Pre-rendered Jalali creation date, when the writer stored one.
    pub const JALALI_DATE: &str = "jalaliDate";
}

/// Aliases for the currency amount of a balance transaction.
pub const BALANCE_AMOUNT_ALIASES: &[&str] = &["amount", "total", "value", "Amount", "Total"];

/// Aliases for the traded quantity of a trade.
pub const TRADE_QUANTITY_ALIASES: &[&str] =
    &["amount", "tradeableAmount", "quantity", "qty", "Amount"];

/// Aliases for the currency total of a trade.
pub const TRADE_TOTAL_ALIASES: &[&str] =
    &["total", "price", "value", "Total", "Payable", "payable"];

const DEPOSIT_MARKERS: [&str; 2] = ["deposit", "واریز"];
const WITHDRAWAL_MARKERS: [&str; 2] = ["withdraw", "برداشت"];
const APPROVED_STATUSES: [&str; 3] = ["accepted", "approved", "confirmed"];
const REJECTED_STATUSES: [&str; 2] = ["rejected", "declined"];

/// Lower-cased type code, empty when absent.
#[must_use]
pub fn type_code(record: &Document) -> String {
    record.text(fields::TYPE).unwrap_or_default().to_lowercase()
}

/// Lower-cased status code, empty when absent.
#[must_use]
pub fn status_code(record: &Document) -> String {
    record.text(fields::STATUS).unwrap_or_default().to_lowercase()
}

/// Returns `true` if a balance type code denotes a deposit.
#[must_use]
pub fn is_deposit(type_code: &str) -> bool {
    DEPOSIT_MARKERS.iter().any(|m| type_code.contains(m))
}

/// Returns `true` if a balance type code denotes a withdrawal.
#[must_use]
pub fn is_withdrawal(type_code: &str) -> bool {
    WITHDRAWAL_MARKERS.iter().any(|m| type_code.contains(m))
}

/// Returns `true` if a balance status code means approved.
#[must_use]
pub fn is_approved(status_code: &str) -> bool {
    APPROVED_STATUSES.contains(&status_code)
}

/// Returns `true` if a balance status code means rejected.
#[must_use]
pub fn is_rejected(status_code: &str) -> bool {
    REJECTED_STATUSES.contains(&status_code)
}

/// Returns `true` if a trade status code means the trade settled.
#[must_use]
pub fn is_settled(status_code: &str) -> bool {
    is_approved(status_code) || status_code == "successful"
}

/// Returns `true` if a trade type code is a purchase.
#[must_use]
pub fn is_buy(type_code: &str) -> bool {
    matches!(type_code, "buy" | "purchase")
}

/// Returns `true` if a trade type code is a sale.
#[must_use]
pub fn is_sell(type_code: &str) -> bool {
    type_code == "sell"
}

/// Owning account reference.
#[must_use]
pub fn owner_id(record: &Document) -> Option<String> {
    record.text(fields::OWNER)
}

/// Traded instrument reference.
#[must_use]
pub fn instrument_id(record: &Document) -> Option<String> {
    record.text(fields::INSTRUMENT)
}

/// The time the record last changed: `updatedAt`, else `createdAt`.
#[must_use]
pub fn effective_timestamp(record: &Document) -> Option<String> {
    record
        .text(fields::UPDATED_AT)
        .or_else(|| record.text(fields::CREATED_AT))
}
