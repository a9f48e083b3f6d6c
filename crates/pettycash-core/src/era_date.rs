//! Era-date codec
//!
//! The clerks write dates in the local era notation `YYY.MM.DD`, where the
//! year counts from 1911 (so `113.05.20` is 2024-05-20). This module converts
//! between that notation and [`NaiveDate`].
//!
//! Parsing is lenient: the year may have 2 to 4 digits and month/day may omit
//! the leading zero. A year of 1911 or later is taken as a calendar year
//! as-is, which rescues rows typed with a western year. Anything that does not
//! form a valid date parses to `None`; callers leave such rows out of date
//! reasoning instead of failing.

use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

/// Difference between the calendar year and the era year
pub const ERA_OFFSET: i32 = 1911;

fn parse_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([0-9]{2,4})\.([0-9]{1,2})\.([0-9]{1,2})$").expect("valid regex")
    })
}

fn canonical_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]{2,3}\.[0-9]{2}\.[0-9]{2}$").expect("valid regex"))
}

/// Whether `s` is an era date in the strict form accepted at import
/// (`\d{2,3}.\d{2}.\d{2}`)
pub fn is_canonical(s: &str) -> bool {
    canonical_pattern().is_match(s)
}

/// Parse an era date into a calendar date
pub fn parse(s: &str) -> Option<NaiveDate> {
    let caps = parse_pattern().captures(s)?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;

    let year = if year < ERA_OFFSET {
        year + ERA_OFFSET
    } else {
        year
    };

    NaiveDate::from_ymd_opt(year, month, day)
}

/// Format a calendar date in era notation (`113.05.20`)
///
/// The era year is written without padding; month and day always take two
/// digits. This does not necessarily reproduce the text a date was parsed
/// from (`113.5.2` formats back as `113.05.02`).
pub fn format(date: NaiveDate) -> String {
    format!(
        "{}.{:02}.{:02}",
        date.year() - ERA_OFFSET,
        date.month(),
        date.day()
    )
}

/// Parse a date typed by a user: era notation or ISO `YYYY-MM-DD`
pub fn parse_user_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    parse(s).or_else(|| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_era_date() {
        assert_eq!(parse("113.05.20"), Some(ymd(2024, 5, 20)));
        assert_eq!(parse("99.12.31"), Some(ymd(2010, 12, 31)));
        assert_eq!(parse("113.5.2"), Some(ymd(2024, 5, 2)));
    }

    #[test]
    fn test_parse_western_year_passes_through() {
        assert_eq!(parse("2024.05.20"), Some(ymd(2024, 5, 20)));
        assert_eq!(parse("1911.01.01"), Some(ymd(1911, 1, 1)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse("abc"), None);
        assert_eq!(parse(""), None);
        assert_eq!(parse("2024/05/20"), None);
        assert_eq!(parse(" 113.05.20"), None);
        assert_eq!(parse("113.05.20.1"), None);
    }

    #[test]
    fn test_parse_rejects_impossible_dates() {
        assert_eq!(parse("113.13.40"), None);
        assert_eq!(parse("113.02.30"), None);
        assert_eq!(parse("113.00.10"), None);
        // 2023 is not a leap year, 2024 is
        assert_eq!(parse("112.02.29"), None);
        assert_eq!(parse("113.02.29"), Some(ymd(2024, 2, 29)));
    }

    #[test]
    fn test_format_round_trip() {
        assert_eq!(format(parse("113.05.20").unwrap()), "113.05.20");
        assert_eq!(format(parse("113.5.2").unwrap()), "113.05.02");
        assert_eq!(format(parse("2024.05.20").unwrap()), "113.05.20");
        assert_eq!(format(ymd(2011, 1, 9)), "100.01.09");
        assert_eq!(format(ymd(2000, 10, 1)), "89.10.01");
    }

    #[test]
    fn test_is_canonical() {
        assert!(is_canonical("113.05.20"));
        assert!(is_canonical("99.01.01"));
        assert!(!is_canonical("113.5.20"));
        assert!(!is_canonical("2024.05.20"));
        assert!(!is_canonical("2024/05/20"));
        assert!(!is_canonical("113.05.20 "));
        // Shape only; calendar validity is checked at query time
        assert!(is_canonical("113.13.40"));
    }

    #[test]
    fn test_parse_user_date() {
        assert_eq!(parse_user_date("113.01.01"), Some(ymd(2024, 1, 1)));
        assert_eq!(parse_user_date("2024-01-01"), Some(ymd(2024, 1, 1)));
        assert_eq!(parse_user_date(" 2024-03-15 "), Some(ymd(2024, 3, 15)));
        assert_eq!(parse_user_date("01/15/2024"), None);
    }
}
