//! Small helpers: symbol/date normalization and option symbol formats.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use regex::Regex;

use crate::error::ValidationError;
use crate::types::OptionRight;

pub fn sanitize_symbol(sym: &str) -> String {
    sym.trim().to_uppercase()
}

/// Strike formatting for descriptions: "150" not "150.0", "12.5" as-is.
pub fn trim_trailing_zeros(v: f64) -> String {
    format!("{}", v)
}

/// Parse an expiry date in the formats the platform and operators use:
/// "10/24/25", "10/24/2025", "2025-10-24", "Oct 24 2025", and the
/// platform's compact month form "Oct25" (resolved to the third Friday,
/// the standard monthly expiration).
pub fn parse_expiry(s: &str) -> Result<NaiveDate, ValidationError> {
    let t = s.trim();

    // Compact month form like "Oct25".
    let re_month = Regex::new(r"^(?i)([A-Za-z]{3})(\d{2})$").unwrap();
    if let Some(c) = re_month.captures(t) {
        if let Some(month) = month_from_abbr(&c[1]) {
            let year = 2000 + c[2].parse::<i32>().unwrap_or(0);
            if let Some(d) = third_friday(year, month) {
                return Ok(d);
            }
        }
    }

    // "MM/DD/YY" or "MM/DD/YYYY".
    if t.contains('/') {
        let parts: Vec<&str> = t.split('/').collect();
        if parts.len() == 3 {
            let month: Option<u32> = parts[0].trim().parse().ok();
            let day: Option<u32> = parts[1].trim().parse().ok();
            let year: Option<i32> = parts[2].trim().parse().ok();
            if let (Some(m), Some(d), Some(y)) = (month, day, year) {
                let y = if y < 100 { 2000 + y } else { y };
                if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
                    return Ok(date);
                }
            }
        }
        return Err(ValidationError::UnparseableExpiry(s.to_string()));
    }

    for fmt in ["%Y-%m-%d", "%b %d %Y", "%B %d %Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(t, fmt) {
            return Ok(d);
        }
    }

    Err(ValidationError::UnparseableExpiry(s.to_string()))
}

fn month_from_abbr(s: &str) -> Option<u32> {
    match s.to_ascii_lowercase().as_str() {
        "jan" => Some(1),
        "feb" => Some(2),
        "mar" => Some(3),
        "apr" => Some(4),
        "may" => Some(5),
        "jun" => Some(6),
        "jul" => Some(7),
        "aug" => Some(8),
        "sep" => Some(9),
        "oct" => Some(10),
        "nov" => Some(11),
        "dec" => Some(12),
        _ => None,
    }
}

/// Third Friday of a month, the standard monthly options expiration.
pub fn third_friday(year: i32, month: u32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let to_friday = (Weekday::Fri.num_days_from_monday() + 7
        - first.weekday().num_days_from_monday())
        % 7;
    Some(first + Duration::days(i64::from(to_friday) + 14))
}

/// Next Friday strictly after `from` (a Friday rolls to the following
/// week, matching how weekly expirations are picked after the close).
pub fn next_friday(from: NaiveDate) -> NaiveDate {
    let wd = from.weekday().num_days_from_monday() as i64;
    let mut ahead = Weekday::Fri.num_days_from_monday() as i64 - wd;
    if ahead <= 0 {
        ahead += 7;
    }
    from + Duration::days(ahead)
}

/// Friday of the week after next relative to `from`.
pub fn friday_after_next(from: NaiveDate) -> NaiveDate {
    next_friday(next_friday(from) + Duration::days(1))
}

/// OCC-style option quote symbol:
/// `<underlying><YYMMDD><C|P><strike x1000, 8 digits>`.
pub fn occ_symbol(underlying: &str, expiry: NaiveDate, right: OptionRight, strike: f64) -> String {
    let letter = match right {
        OptionRight::Call => 'C',
        OptionRight::Put => 'P',
    };
    format!(
        "{}{}{}{:08}",
        underlying.to_uppercase(),
        expiry.format("%y%m%d"),
        letter,
        (strike * 1000.0).round() as i64
    )
}

/// Expiry in the platform's `MaturityMonthYear` wire form, YYYYMMDD.
pub fn maturity_month_year(expiry: NaiveDate) -> String {
    expiry.format("%Y%m%d").to_string()
}

/// Timestamp rendering used across the tables, e.g. "10/06/25 09:30".
pub fn format_ts(ts: &chrono::DateTime<chrono::Utc>) -> String {
    ts.format("%m/%d/%y %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn expiry_slash_two_digit_year() {
        assert_eq!(parse_expiry("10/24/25").unwrap(), d(2025, 10, 24));
    }

    #[test]
    fn expiry_slash_four_digit_year() {
        assert_eq!(parse_expiry("10/24/2025").unwrap(), d(2025, 10, 24));
    }

    #[test]
    fn expiry_iso() {
        assert_eq!(parse_expiry("2025-10-24").unwrap(), d(2025, 10, 24));
    }

    #[test]
    fn expiry_month_name() {
        assert_eq!(parse_expiry("Oct 24 2025").unwrap(), d(2025, 10, 24));
        assert_eq!(parse_expiry("October 24 2025").unwrap(), d(2025, 10, 24));
    }

    #[test]
    fn expiry_compact_month_resolves_to_third_friday() {
        assert_eq!(parse_expiry("Oct25").unwrap(), d(2025, 10, 17));
        assert_eq!(parse_expiry("nov25").unwrap(), d(2025, 11, 21));
    }

    #[test]
    fn expiry_garbage_is_an_error() {
        assert!(parse_expiry("someday").is_err());
        assert!(parse_expiry("13/45/25").is_err());
        assert!(parse_expiry("").is_err());
    }

    #[test]
    fn third_fridays() {
        assert_eq!(third_friday(2025, 10), Some(d(2025, 10, 17)));
        assert_eq!(third_friday(2025, 8), Some(d(2025, 8, 15)));
        // Month starting on a Friday.
        assert_eq!(third_friday(2025, 8).unwrap().weekday(), Weekday::Fri);
    }

    #[test]
    fn friday_helpers() {
        // 2025-10-06 is a Monday.
        assert_eq!(next_friday(d(2025, 10, 6)), d(2025, 10, 10));
        // A Friday rolls to the following week.
        assert_eq!(next_friday(d(2025, 10, 10)), d(2025, 10, 17));
        assert_eq!(friday_after_next(d(2025, 10, 6)), d(2025, 10, 17));
    }

    #[test]
    fn occ_symbol_format() {
        assert_eq!(
            occ_symbol("NBIS", d(2025, 10, 24), OptionRight::Call, 150.0),
            "NBIS251024C00150000"
        );
        assert_eq!(
            occ_symbol("lly", d(2025, 10, 17), OptionRight::Put, 775.0),
            "LLY251017P00775000"
        );
        // Fractional strikes keep sub-dollar precision.
        assert_eq!(
            occ_symbol("AAPL", d(2025, 8, 16), OptionRight::Call, 12.5),
            "AAPL250816C00012500"
        );
    }

    #[test]
    fn maturity_wire_form() {
        assert_eq!(maturity_month_year(d(2025, 10, 24)), "20251024");
    }

    #[test]
    fn symbol_sanitizing() {
        assert_eq!(sanitize_symbol("  aapl "), "AAPL");
    }
}
