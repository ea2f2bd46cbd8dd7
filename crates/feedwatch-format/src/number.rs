//! Amount formatting.

use crate::PLACEHOLDER;
use crate::digits::normalize_digits;

/// Formats a numeric string with comma thousands separators.
///
/// Localized digits are normalized and existing commas dropped before
/// parsing. The fractional part is kept verbatim (no rounding, trailing
/// zeros preserved). A missing or blank value renders as `-`; anything that
/// is not a plain decimal number is returned unchanged.
#[must_use]
pub fn format_thousands(value: Option<&str>) -> String {
    let Some(raw) = value else {
        return PLACEHOLDER.to_owned();
    };
    let normalized: String = normalize_digits(raw.trim())
        .chars()
        .filter(|c| *c != ',')
        .collect();
    if normalized.is_empty() {
        return PLACEHOLDER.to_owned();
    }

    let Some((negative, int_part, frac_part)) = split_decimal(&normalized) else {
        return raw.to_owned();
    };

    let mut out = String::with_capacity(normalized.len() + int_part.len() / 3);
    if negative {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Splits `-?\d+(\.\d+)?` into sign, integer digits and fraction digits.
fn split_decimal(s: &str) -> Option<(bool, &str, Option<&str>)> {
    let (negative, unsigned) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (unsigned, None),
    };
    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(int_part) || frac_part.is_some_and(|f| !all_digits(f)) {
        return None;
    }
    Some((negative, int_part, frac_part))
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
