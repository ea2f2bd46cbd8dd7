//! Code-to-label vocabularies.
//!
//! Unrecognized codes are passed through unchanged so that new upstream
//! codes display raw instead of failing.

use crate::PLACEHOLDER;

/// Label for an approved/successful status.
pub const STATUS_APPROVED: &str = "تایید";
/// Label for a rejected/failed status.
pub const STATUS_REJECTED: &str = "رد";
/// Label for a pending status.
pub const STATUS_PENDING: &str = "در انتظار";

/// Label for gold.
pub const GOLD: &str = "طلا";
/// Label for silver.
pub const SILVER: &str = "نقره";
/// Label for tether.
pub const TETHER: &str = "تتر";

/// Label for an offline (manually recorded) deposit.
pub const OFFLINE_DEPOSIT: &str = "واریز دستی";
/// Label for an online deposit.
pub const DEPOSIT: &str = "واریز";
/// Label for a withdrawal.
pub const WITHDRAWAL: &str = "برداشت";

const APPROVED_CODES: [&str; 9] = [
    "accepted",
    "accept",
    "approved",
    "success",
    "successful",
    "done",
    "completed",
    "complete",
    "confirmed",
];
const REJECTED_CODES: [&str; 7] = [
    "rejected",
    "reject",
    "failed",
    "failure",
    "canceled",
    "cancelled",
    "declined",
];
const PENDING_CODES: [&str; 5] = ["pending", "waiting", "inprogress", "in_progress", "processing"];

fn lower(code: Option<&str>) -> (String, String) {
    let raw = code.unwrap_or_default().trim().to_owned();
    let lowered = raw.to_lowercase();
    (raw, lowered)
}

/// Maps a trade type code to its label.
#[must_use]
pub fn trade_type_label(code: Option<&str>) -> String {
    let (raw, t) = lower(code);
    match t.as_str() {
        "" => PLACEHOLDER.to_owned(),
        "buy" | "purchase" => "خرید".to_owned(),
        "sell" => "فروش".to_owned(),
        _ => raw,
    }
}

/// Maps a status code to its label.
#[must_use]
pub fn status_label(code: Option<&str>) -> String {
    let (raw, s) = lower(code);
    if s.is_empty() {
        PLACEHOLDER.to_owned()
    } else if APPROVED_CODES.contains(&s.as_str()) {
        STATUS_APPROVED.to_owned()
    } else if REJECTED_CODES.contains(&s.as_str()) {
        STATUS_REJECTED.to_owned()
    } else if PENDING_CODES.contains(&s.as_str()) {
        STATUS_PENDING.to_owned()
    } else {
        raw
    }
}

/// Trailing verb phrase describing a status ("was approved", ...).
///
/// Empty when the status is missing.
#[must_use]
pub fn status_phrase(code: Option<&str>) -> String {
    let label = status_label(code);
    match label.as_str() {
        STATUS_APPROVED => "تایید شد".to_owned(),
        STATUS_REJECTED => "رد شد".to_owned(),
        STATUS_PENDING => "در انتظار است".to_owned(),
        PLACEHOLDER => String::new(),
        _ => format!("{label} است"),
    }
}

/// Maps an instrument name or symbol to its label.
#[must_use]
pub fn instrument_label(name: Option<&str>) -> String {
    let (raw, t) = lower(name);
    if t.is_empty() {
        PLACEHOLDER.to_owned()
    } else if t.contains("usdt") || t.contains("tether") || raw.contains(TETHER) {
        TETHER.to_owned()
    } else if t.contains("gold") || t.contains("xau") || raw.contains(GOLD) {
        GOLD.to_owned()
    } else if t.contains("silver") || t.contains("xag") || raw.contains(SILVER) {
        SILVER.to_owned()
    } else {
        raw
    }
}

/// Quantity unit for an instrument label: grams for metals, units otherwise.
#[must_use]
pub fn instrument_unit(label: &str) -> &'static str {
    match label.trim() {
        GOLD | SILVER => "گرم",
        _ => "واحد",
    }
}

/// Maps a balance transaction type code to its label.
#[must_use]
pub fn balance_type_label(code: Option<&str>) -> String {
    let (raw, t) = lower(code);
    if t.is_empty() {
        PLACEHOLDER.to_owned()
    } else if t.contains("offlinedeposit")
        || t.contains("offline_deposit")
        || raw.contains(OFFLINE_DEPOSIT)
    {
        OFFLINE_DEPOSIT.to_owned()
    } else if t.contains("onlinedeposit") || t.contains("online_deposit") || t.contains("iddeposit")
    {
        DEPOSIT.to_owned()
    } else if t.contains("withdraw") {
        WITHDRAWAL.to_owned()
    } else {
        raw
    }
}

/// Display label for an account: full name, else mobile number, else `-`.
#[must_use]
pub fn account_label(
    first_name: Option<&str>,
    last_name: Option<&str>,
    mobile_number: Option<&str>,
) -> String {
    let name = format!(
        "{} {}",
        first_name.unwrap_or_default(),
        last_name.unwrap_or_default()
    );
    let name = name.trim();
    if !name.is_empty() {
        return name.to_owned();
    }
    mobile_number
        .filter(|m| !m.trim().is_empty())
        .unwrap_or(PLACEHOLDER)
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_label_maps_known_codes_case_insensitively() {
        assert_eq!(status_label(Some("Approved")), STATUS_APPROVED);
        assert_eq!(status_label(Some("SUCCESSFUL")), STATUS_APPROVED);
        assert_eq!(status_label(Some("declined")), STATUS_REJECTED);
        assert_eq!(status_label(Some("in_progress")), STATUS_PENDING);
        assert_eq!(status_label(None), "-");
    }

    #[test]
    fn test_unknown_codes_pass_through_unchanged() {
        assert_eq!(status_label(Some("OnHold")), "OnHold");
        assert_eq!(trade_type_label(Some("Swap")), "Swap");
        assert_eq!(balance_type_label(Some("Refund")), "Refund");
        assert_eq!(instrument_label(Some("Platinum")), "Platinum");
    }

    #[test]
    fn test_status_phrase_wraps_unknown_labels() {
        assert_eq!(status_phrase(Some("accepted")), "تایید شد");
        assert_eq!(status_phrase(Some("OnHold")), "OnHold است");
        assert_eq!(status_phrase(None), "");
    }

    #[test]
    fn test_instrument_label_and_unit() {
        assert_eq!(instrument_label(Some("Gold 18K")), GOLD);
        assert_eq!(instrument_label(Some("XAG")), SILVER);
        assert_eq!(instrument_label(Some("USDT")), TETHER);
        assert_eq!(instrument_unit(GOLD), "گرم");
        assert_eq!(instrument_unit(TETHER), "واحد");
    }

    #[test]
    fn test_balance_type_label_distinguishes_offline_deposits() {
        assert_eq!(balance_type_label(Some("OfflineDeposit")), OFFLINE_DEPOSIT);
        assert_eq!(balance_type_label(Some("OnlineDeposit")), DEPOSIT);
        assert_eq!(balance_type_label(Some("IdDeposit")), DEPOSIT);
        assert_eq!(balance_type_label(Some("Withdraw")), WITHDRAWAL);
    }

    #[test]
    fn test_account_label_falls_back_to_mobile_then_placeholder() {
        assert_eq!(account_label(Some("Sara"), Some("Karimi"), None), "Sara Karimi");
        assert_eq!(account_label(None, None, Some("0912")), "0912");
        assert_eq!(account_label(Some(" "), None, None), "-");
    }
}
