//! Localized digit normalization.

/// Replaces Persian (U+06F0..U+06F9) and Arabic-Indic (U+0660..U+0669)
/// digits with their ASCII equivalents. Other characters are kept.
#[must_use]
pub fn normalize_digits(input: &str) -> String {
    input.chars().map(ascii_digit).collect()
}

fn ascii_digit(c: char) -> char {
    let zero = match c {
        '\u{06F0}'..='\u{06F9}' => 0x06F0,
        '\u{0660}'..='\u{0669}' => 0x0660,
        _ => return c,
    };
    char::from_digit(u32::from(c) - zero, 10).unwrap_or(c)
}

/// Normalizes a phone number for sending and allowlist comparison.
///
/// Returns `None` when nothing is left after trimming.
#[must_use]
pub fn normalize_recipient(raw: &str) -> Option<String> {
    let normalized = normalize_digits(raw.trim());
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}
