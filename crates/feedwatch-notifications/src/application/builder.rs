//! User-facing message templates.

use chrono::FixedOffset;
use feedwatch_core::account::Account;
use feedwatch_core::document::Document;
use feedwatch_format::date::jalali_date_time_parts;
use feedwatch_format::labels::{instrument_label, instrument_unit};
use feedwatch_format::number::format_thousands;

use crate::domain::kind::NotificationKind;
use crate::domain::record::{self, fields};

/// Brand line opening several templates.
pub const BRAND: &str = "مهرسان گلد";
/// Fallback for a missing reason, tracking number or balance.
pub const UNSPECIFIED: &str = "نامشخص";

const GENERIC_GREETING: &str = "کاربر عزیز";
const SUPPORT_LINE: &str = "پشتیبانی:07644421176";

/// Renders first-person messages for account holders.
#[derive(Debug, Clone, Copy)]
pub struct MessageBuilder {
    display_offset: FixedOffset,
}

impl MessageBuilder {
    /// Creates a builder rendering times at `display_offset`.
    #[must_use]
    pub fn new(display_offset: FixedOffset) -> Self {
        Self { display_offset }
    }

    /// Renders the message for `kind`.
    ///
    /// `record` is the record that triggered the notification (the account
    /// record itself for account kinds). Returns `None` when the kind has no
    /// user template or no account was resolved; the caller skips the send.
    #[must_use]
    pub fn build(
        &self,
        kind: NotificationKind,
        record: &Document,
        account: Option<&Account>,
    ) -> Option<String> {
        let account = account?;
        let lines = match kind {
            NotificationKind::UserRegistrationWelcome => vec![
                greeting(account),
                "پیش ثبت‌نام شما با موفقیت انجام شد.".to_owned(),
                "جهت تکمیل ثبت نام مراحل احراز هویت را کامل نمایید.".to_owned(),
                SUPPORT_LINE.to_owned(),
            ],
            NotificationKind::KycApproved => vec![
                greeting(account),
                "احراز هویت شما در مهرسان گلد با موفقیت تأیید شد.".to_owned(),
                "اکنون می‌توانید از تمام خدمات سامانه استفاده کنید.".to_owned(),
            ],
            NotificationKind::KycRejected => vec![
                greeting(account),
                "احراز هویت شما در مهرسان گلد تأیید نشد.".to_owned(),
                format!(
                    "دلیل: {}",
                    account.verify_description.as_deref().unwrap_or(UNSPECIFIED)
                ),
                "لطفاً اطلاعات خود را اصلاح و مجدداً ارسال کنید.".to_owned(),
            ],
            NotificationKind::KycReminder => vec![
                greeting(account),
                "احراز هویت شما در مهرسان گلد هنوز تکمیل نشده است.".to_owned(),
                "برای فعال‌سازی کامل حساب و دریافت هدیه 5میلی طلا ، لطفاً مراحل احراز هویت را انجام دهید."
                    .to_owned(),
            ],
            NotificationKind::PasswordChanged => vec![
                greeting(account),
                "رمز عبور حساب شما در مهرسان گلد با موفقیت تغییر کرد.".to_owned(),
            ],
            NotificationKind::DepositRequested => vec![
                "درخواست واریز شما در مهرسان گلد ثبت شد.".to_owned(),
                amount_line(record),
                tracking_line(record.id()),
                "پس از بررسی اطلاع‌رسانی خواهد شد.".to_owned(),
            ],
            NotificationKind::DepositApproved => {
                let (date, time) = jalali_date_time_parts(
                    record::effective_timestamp(record).as_deref(),
                    self.display_offset,
                );
                let wallet = account
                    .toman_balance
                    .as_deref()
                    .map_or_else(|| UNSPECIFIED.to_owned(), |b| format_thousands(Some(b)));
                vec![
                    BRAND.to_owned(),
                    "واریز شما در مهرسان گلد با موفقیت تأیید شد.".to_owned(),
                    amount_line(record),
                    format!("موجودی کیف پول: {wallet} تومان"),
                    format!("تاریخ: {date}"),
                    format!("ساعت: {time}"),
                ]
            }
            NotificationKind::DepositRejected => vec![
                "درخواست واریز شما در مهرسان گلد تأیید نشد.".to_owned(),
                amount_line(record),
                format!(
                    "دلیل: {}",
                    record
                        .text(fields::CONFIRM_DESCRIPTION)
                        .as_deref()
                        .unwrap_or(UNSPECIFIED)
                ),
            ],
            NotificationKind::WithdrawalRequested => vec![
                "درخواست برداشت شما در مهرسان گلد ثبت شد.".to_owned(),
                amount_line(record),
                tracking_line(record.id()),
                "در حال بررسی می‌باشد.".to_owned(),
            ],
            NotificationKind::WithdrawalApproved => vec![
                "برداشت شما از مهرسان گلد با موفقیت انجام شد.".to_owned(),
                amount_line(record),
                tracking_line(record.text(fields::TRACKING_CODE).or_else(|| record.id())),
            ],
            NotificationKind::BuyCompleted => trade_lines("خرید", record, account),
            NotificationKind::SellCompleted => trade_lines("فروش", record, account),
            NotificationKind::GenericAudit => return None,
        };
        Some(lines.join("\n"))
    }
}

fn greeting(account: &Account) -> String {
    match account.first_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => format!("{name} عزیز"),
        _ => GENERIC_GREETING.to_owned(),
    }
}

fn amount_line(record: &Document) -> String {
    let amount = record.pick_first_present(record::BALANCE_AMOUNT_ALIASES);
    format!("مبلغ: {} تومان", format_thousands(amount.as_deref()))
}

fn tracking_line(reference: Option<String>) -> String {
    format!(
        "شماره پیگیری: {}",
        reference.as_deref().unwrap_or(UNSPECIFIED)
    )
}

/// Instrument label and its unit, read from the enriched name or the raw
/// reference.
pub(crate) fn instrument_of(record: &Document) -> (String, &'static str) {
    let raw = record
        .text(fields::INSTRUMENT_NAME)
        .or_else(|| record.text(fields::INSTRUMENT));
    let label = instrument_label(raw.as_deref());
    let unit = instrument_unit(&label);
    (label, unit)
}

fn trade_lines(verb: &str, record: &Document, account: &Account) -> Vec<String> {
    let (instrument, unit) = instrument_of(record);
    let quantity = format_thousands(
        record
            .pick_first_present(record::TRADE_QUANTITY_ALIASES)
            .as_deref(),
    );
    let total = format_thousands(record.pick_first_present(record::TRADE_TOTAL_ALIASES).as_deref());
    let balance =
        |value: Option<&str>| value.map_or_else(|| "0".to_owned(), |v| format_thousands(Some(v)));
    vec![
        BRAND.to_owned(),
        String::new(),
        format!("{verb} {quantity} {unit} {instrument} به مبلغ {total} با موفقیت انجام شد."),
        format!("مانده موجودی طلا: {}", balance(account.gold_balance.as_deref())),
        format!("مانده موجودی نقره: {}", balance(account.silver_balance.as_deref())),
        format!("مانده موجودی تومان: {}", balance(account.toman_balance.as_deref())),
    ]
}
