//! Operator-facing (audit) message templates: a one-line SMS and a field
//! dump email per monetary event, plus a summary email for new accounts.

use chrono::FixedOffset;
use feedwatch_core::account::{Account, fields as account_fields};
use feedwatch_core::document::Document;
use feedwatch_format::PLACEHOLDER;
use feedwatch_format::date::{format_jalali_datetime, jalali_date_time_parts};
use feedwatch_format::labels::{
    OFFLINE_DEPOSIT, account_label, balance_type_label, status_phrase, trade_type_label,
};
use feedwatch_format::number::format_thousands;

use crate::application::builder::{BRAND, instrument_of};
use crate::domain::classify::AuditEvent;
use crate::domain::record::{self, fields};

/// A rendered operator email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminEmail {
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

/// Renders third-person messages for operators.
#[derive(Debug, Clone, Copy)]
pub struct AuditComposer {
    display_offset: FixedOffset,
}

impl AuditComposer {
    /// Creates a composer rendering times at `display_offset`.
    #[must_use]
    pub fn new(display_offset: FixedOffset) -> Self {
        Self { display_offset }
    }

    /// Renders the operator SMS for `event`, or `None` if the event has no
    /// SMS form.
    #[must_use]
    pub fn admin_sms(
        &self,
        event: AuditEvent,
        record: &Document,
        account: Option<&Account>,
    ) -> Option<String> {
        match event {
            AuditEvent::TradeCreated | AuditEvent::TradeStatusChanged => {
                Some(trade_summary(record, account))
            }
            AuditEvent::BalanceCreated | AuditEvent::BalanceStatusChanged => {
                Some(self.balance_summary(record, account))
            }
            AuditEvent::AccountCreated => None,
        }
    }

    /// Renders the operator email for `event`.
    #[must_use]
    pub fn admin_email(
        &self,
        event: AuditEvent,
        record: &Document,
        account: Option<&Account>,
    ) -> AdminEmail {
        let raw = |key: &str| record.text(key).unwrap_or_default();
        let instrument = raw(fields::INSTRUMENT_NAME);
        let subject = match event {
            AuditEvent::BalanceCreated => {
                format!("New BalanceTx — {} {}", raw(fields::TYPE), raw(fields::AMOUNT))
            }
            AuditEvent::BalanceStatusChanged => format!(
                "BalanceTx status → {} — {} {}",
                raw(fields::STATUS),
                raw(fields::TYPE),
                raw(fields::AMOUNT)
            ),
            AuditEvent::TradeCreated => format!(
                "New Transaction — {} {} {} ({})",
                raw(fields::TYPE),
                raw(fields::AMOUNT),
                instrument,
                raw(fields::STATUS)
            ),
            AuditEvent::TradeStatusChanged => format!(
                "Transaction status → {} — {} {} {}",
                raw(fields::STATUS),
                raw(fields::TYPE),
                raw(fields::AMOUNT),
                instrument
            ),
            AuditEvent::AccountCreated => format!(
                "New User — {} {} ({})",
                raw(account_fields::FIRST_NAME),
                raw(account_fields::LAST_NAME),
                raw(account_fields::MOBILE_NUMBER)
            ),
        };
        let body = match event {
            AuditEvent::AccountCreated => account_dump(record),
            _ => self.record_dump(record),
        };
        let body = match account.map(user_details) {
            Some(details) => format!("{body}\n{details}"),
            None => body,
        };
        AdminEmail {
            subject: collapse_whitespace(&subject),
            body,
        }
    }

    fn balance_summary(&self, record: &Document, account: Option<&Account>) -> String {
        let amount = format_thousands(
            record
                .pick_first_present(record::BALANCE_AMOUNT_ALIASES)
                .as_deref(),
        );
        let type_label = balance_type_label(record.text(fields::TYPE).as_deref());
        let holder = holder_label(account);

        if type_label == OFFLINE_DEPOSIT {
            let (date, time) = jalali_date_time_parts(
                record::effective_timestamp(record).as_deref(),
                self.display_offset,
            );
            let remaining = account
                .and_then(|a| a.toman_balance.as_deref())
                .map(|b| format!("مانده حساب: {} تومان", format_thousands(Some(b))));
            return [
                Some(BRAND.to_owned()),
                Some(format!("واريز مبلغ {amount} تومان")),
                Some(format!("به حساب {holder}")),
                remaining,
                Some(date),
                Some(time),
            ]
            .into_iter()
            .flatten()
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        }

        let phrase = status_phrase(record.text(fields::STATUS).as_deref());
        collapse_whitespace(&format!(
            "{type_label} مبلغ {amount} توسط {holder} {phrase}"
        ))
    }

    fn record_dump(&self, record: &Document) -> String {
        let number = |key: &str| format_thousands(record.text(key).as_deref());
        let text = |key: &str| record.text(key).unwrap_or_else(|| PLACEHOLDER.to_owned());
        let instrument = record
            .text(fields::INSTRUMENT_NAME)
            .or_else(|| record.text(fields::INSTRUMENT))
            .unwrap_or_else(|| PLACEHOLDER.to_owned());
        let created = record.text(fields::JALALI_DATE).unwrap_or_else(|| {
            format_jalali_datetime(
                record.text(fields::CREATED_AT).as_deref(),
                self.display_offset,
            )
        });
        let updated = format_jalali_datetime(
            record.text(fields::UPDATED_AT).as_deref(),
            self.display_offset,
        );
        [
            format!("Type: {}", text(fields::TYPE)),
            format!("Amount: {}", number(fields::AMOUNT)),
            format!("Wage: {}", number(fields::WAGE)),
            format!("Total: {}", number(fields::TOTAL)),
            format!("TradeablePrice: {}", number(fields::INSTRUMENT_PRICE)),
            format!("Tradeable: {instrument}"),
            format!("Status: {}", text(fields::STATUS)),
            format!("CreatedAt: {created}"),
            format!("UpdatedAt: {updated}"),
            format!("ConfirmDescription: {}", text(fields::CONFIRM_DESCRIPTION)),
            format!("_id: {}", record.id().as_deref().unwrap_or(PLACEHOLDER)),
        ]
        .join("\n")
    }
}

fn trade_summary(record: &Document, account: Option<&Account>) -> String {
    let type_label = trade_type_label(record.text(fields::TYPE).as_deref());
    let (instrument, unit) = instrument_of(record);
    let quantity = format_thousands(
        record
            .pick_first_present(record::TRADE_QUANTITY_ALIASES)
            .as_deref(),
    );
    let total = format_thousands(record.pick_first_present(record::TRADE_TOTAL_ALIASES).as_deref());
    let phrase = status_phrase(record.text(fields::STATUS).as_deref());
    collapse_whitespace(&format!(
        "{type_label} {quantity} {unit} {instrument} به مبلغ {total} توسط {} {phrase}",
        holder_label(account)
    ))
}

fn account_dump(record: &Document) -> String {
    let text = |key: &str| record.text(key).unwrap_or_else(|| PLACEHOLDER.to_owned());
    [
        format!(
            "Name: {} {}",
            record.text(account_fields::FIRST_NAME).unwrap_or_default(),
            record.text(account_fields::LAST_NAME).unwrap_or_default()
        ),
        format!("Mobile: {}", text(account_fields::MOBILE_NUMBER)),
        format!("Role: {}", text("role")),
        format!("VerificationStatus: {}", text(account_fields::VERIFICATION_STATUS)),
        format!("CreatedAt: {}", text(fields::CREATED_AT)),
        format!("_id: {}", record.id().as_deref().unwrap_or(PLACEHOLDER)),
    ]
    .join("\n")
}

fn holder_label(account: Option<&Account>) -> String {
    account.map_or_else(
        || PLACEHOLDER.to_owned(),
        |a| {
            account_label(
                a.first_name.as_deref(),
                a.last_name.as_deref(),
                a.mobile_number.as_deref(),
            )
        },
    )
}

fn user_details(account: &Account) -> String {
    format!(
        "User: {} {} ({})",
        account.first_name.as_deref().unwrap_or(PLACEHOLDER),
        account.last_name.as_deref().unwrap_or(PLACEHOLDER),
        account.mobile_number.as_deref().unwrap_or(PLACEHOLDER)
    )
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
