use chrono::{Datelike, NaiveDate};

/// Trailing characters of a traceability code holding the packing date as `DDMMYY`.
pub const DATE_SUFFIX_LEN: usize = 6;

/// Two-digit years up to this value belong to the 2000s, the rest to the 1900s.
pub const CENTURY_PIVOT: i32 = 30;

/// Packing date encoded in the tail of a traceability code.
pub fn packing_date(code: &str) -> Option<NaiveDate> {
    let chars: Vec<char> = code.chars().collect();
    if chars.len() < DATE_SUFFIX_LEN {
        return None;
    }

    let tail = &chars[chars.len() - DATE_SUFFIX_LEN..];
    if !tail.iter().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let pair = |i: usize| -> u32 {
        tail[i].to_digit(10).unwrap_or(0) * 10 + tail[i + 1].to_digit(10).unwrap_or(0)
    };
    let (day, month, short_year) = (pair(0), pair(2), pair(4) as i32);

    let year = if short_year <= CENTURY_PIVOT {
        2000 + short_year
    } else {
        1900 + short_year
    };

    NaiveDate::from_ymd_opt(year, month, day)
}

/// ISO week number and four-digit year of the packing date, `(0, 0)` when the
/// code does not carry a valid date.
pub fn decode_traceability(code: &str) -> (u32, i32) {
    packing_date(code)
        .map(|date| (date.iso_week().week(), date.year()))
        .unwrap_or((0, 0))
}
