//! Timestamp parsing and Solar Hijri (Jalali) rendering.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, Timelike, Utc};

use crate::PLACEHOLDER;
use crate::digits::normalize_digits;

/// A date in the Solar Hijri calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JalaliDate {
    /// Year.
    pub year: i32,
    /// Month, 1-12.
    pub month: u32,
    /// Day of month, 1-31.
    pub day: u32,
}

const CUMULATIVE_MONTH_DAYS: [i32; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

/// Converts a Gregorian date to the Solar Hijri calendar.
#[must_use]
pub fn to_jalali(date: NaiveDate) -> JalaliDate {
    let gy = date.year();
    let gm = date.month0() as usize;
    let gd = i32::try_from(date.day()).unwrap_or(1);

    let gy2 = if gm > 1 { gy + 1 } else { gy };
    let mut days = 355_666 + 365 * gy + (gy2 + 3) / 4 - (gy2 + 99) / 100
        + (gy2 + 399) / 400
        + gd
        + CUMULATIVE_MONTH_DAYS[gm];

    let mut year = -1595 + 33 * (days / 12_053);
    days %= 12_053;
    year += 4 * (days / 1461);
    days %= 1461;
    if days > 365 {
        year += (days - 1) / 365;
        days = (days - 1) % 365;
    }

    let (month, day) = if days < 186 {
        (1 + days / 31, 1 + days % 31)
    } else {
        (7 + (days - 186) / 30, 1 + (days - 186) % 30)
    };

    JalaliDate {
        year,
        month: u32::try_from(month).unwrap_or(1),
        day: u32::try_from(day).unwrap_or(1),
    }
}

/// Parses a stored timestamp: RFC 3339, a naive ISO date-time (taken as
/// UTC), or epoch milliseconds.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = normalize_digits(raw.trim());
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&raw, pattern) {
            return Some(naive.and_utc());
        }
    }
    if raw.bytes().all(|b| b.is_ascii_digit()) {
        return raw
            .parse::<i64>()
            .ok()
            .and_then(DateTime::from_timestamp_millis);
    }
    None
}

/// Renders a timestamp as `YYYY-MM-DD HH:mm:ss` in the Jalali calendar,
/// shifted to `offset`.
///
/// Missing values render as `-`; unparsable values are returned unchanged.
#[must_use]
pub fn format_jalali_datetime(value: Option<&str>, offset: FixedOffset) -> String {
    let Some(raw) = value.filter(|v| !v.trim().is_empty()) else {
        return PLACEHOLDER.to_owned();
    };
    let Some(instant) = parse_timestamp(raw) else {
        return raw.to_owned();
    };
    let local = instant.with_timezone(&offset);
    let jalali = to_jalali(local.date_naive());
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        jalali.year,
        jalali.month,
        jalali.day,
        local.hour(),
        local.minute(),
        local.second()
    )
}

/// Splits a timestamp into a Jalali date (`YYYY/M/D`) and a time (`HH:mm`),
/// shifted to `offset`.
///
/// Missing values give two empty strings; unparsable values come back as
/// the date with an empty time.
#[must_use]
pub fn jalali_date_time_parts(value: Option<&str>, offset: FixedOffset) -> (String, String) {
    let Some(raw) = value.filter(|v| !v.trim().is_empty()) else {
        return (String::new(), String::new());
    };
    let Some(instant) = parse_timestamp(raw) else {
        return (raw.to_owned(), String::new());
    };
    let local = instant.with_timezone(&offset);
    let jalali = to_jalali(local.date_naive());
    (
        format!("{}/{}/{}", jalali.year, jalali.month, jalali.day),
        format!("{:02}:{:02}", local.hour(), local.minute()),
    )
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, NaiveDate};

    use super::*;

    fn tehran() -> FixedOffset {
        FixedOffset::east_opt(210 * 60).unwrap()
    }

    #[test]
    fn test_to_jalali_new_year_boundaries() {
        let nowruz = to_jalali(NaiveDate::from_ymd_opt(2024, 3, 20).unwrap());
        assert_eq!(
            nowruz,
            JalaliDate {
                year: 1403,
                month: 1,
                day: 1
            }
        );

        let eve = to_jalali(NaiveDate::from_ymd_opt(2024, 3, 19).unwrap());
        assert_eq!((eve.year, eve.month, eve.day), (1402, 12, 29));
    }

    #[test]
    fn test_to_jalali_second_half_of_year() {
        let date = to_jalali(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap());
        assert_eq!((date.year, date.month, date.day), (1404, 10, 25));
    }

    #[test]
    fn test_parse_timestamp_accepts_rfc3339_naive_and_millis() {
        let expected = NaiveDate::from_ymd_opt(2026, 1, 15)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
            .and_utc();
        assert_eq!(parse_timestamp("2026-01-15T10:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2026-01-15T10:00:00.000"), Some(expected));
        assert_eq!(parse_timestamp("1768471200000"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_jalali_date_time_parts_shifts_to_display_offset() {
        // 22:00 UTC is 01:30 the next day in Tehran.
        let (date, time) = jalali_date_time_parts(Some("2026-01-14T22:00:00Z"), tehran());
        assert_eq!(date, "1404/10/25");
        assert_eq!(time, "01:30");
    }

    #[test]
    fn test_jalali_date_time_parts_degrades_gracefully() {
        assert_eq!(
            jalali_date_time_parts(None, tehran()),
            (String::new(), String::new())
        );
        assert_eq!(
            jalali_date_time_parts(Some("not a date"), tehran()),
            ("not a date".to_owned(), String::new())
        );
    }

    #[test]
    fn test_format_jalali_datetime_pads_fields() {
        assert_eq!(
            format_jalali_datetime(Some("2024-03-20T06:30:05Z"), tehran()),
            "1403-01-01 10:00:05"
        );
        assert_eq!(format_jalali_datetime(None, tehran()), "-");
    }
}
