//! Donation receipt numbers: `RCPT-YYYY-NNNNNN`, sequential per year.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref RECEIPT_FORMAT: Regex = Regex::new(r"^RCPT-(\d{4})-(\d{6})$").unwrap();
}

pub fn format(year: i32, sequence: i64) -> String {
    format!("RCPT-{:04}-{:06}", year, sequence)
}

pub fn validate_format(receipt_number: &str) -> bool {
    RECEIPT_FORMAT.is_match(receipt_number)
}

pub fn parse(receipt_number: &str) -> Option<(i32, i64)> {
    let captures = RECEIPT_FORMAT.captures(receipt_number)?;
    let year = captures.get(1)?.as_str().parse().ok()?;
    let sequence = captures.get(2)?.as_str().parse().ok()?;
    Some((year, sequence))
}

pub fn parse_year(receipt_number: &str) -> Option<i32> {
    parse(receipt_number).map(|(year, _)| year)
}

pub fn parse_sequence(receipt_number: &str) -> Option<i64> {
    parse(receipt_number).map(|(_, sequence)| sequence)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_sequence_to_six_digits() {
        assert_eq!(format(2026, 42), "RCPT-2026-000042");
    }

    #[test]
    fn parses_year_and_sequence() {
        assert_eq!(parse("RCPT-2026-000042"), Some((2026, 42)));
        assert_eq!(parse_year("RCPT-2025-123456"), Some(2025));
        assert_eq!(parse_sequence("RCPT-2025-123456"), Some(123456));
    }

    #[test]
    fn rejects_malformed_numbers() {
        for bad in ["RCPT-26-000042", "RCPT-2026-42", "rcpt-2026-000042", "RCPT-2026-0000421"] {
            assert!(!validate_format(bad), "{}", bad);
            assert_eq!(parse(bad), None);
        }
    }
}
