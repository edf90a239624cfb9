//! Bank transfer reference codes: `SBP-YYYYMMDD-XXXXX`.
//!
//! The random part avoids look-alike characters (`I`, `O`, `0`, `1`) because
//! donors type it into their bank's transfer description by hand.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;

pub const PREFIX: &str = "SBP";
pub const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const RANDOM_PART_LENGTH: usize = 5;

lazy_static! {
    static ref CODE_FORMAT: Regex = Regex::new(r"^[A-Z]{2,5}-\d{8}-[A-Z0-9]{5}$").unwrap();
}

pub fn generate(date: NaiveDate) -> String {
    let mut rng = rand::thread_rng();
    let random: String = (0..RANDOM_PART_LENGTH)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("{}-{}-{}", PREFIX, date.format("%Y%m%d"), random)
}

pub fn validate_format(code: &str) -> bool {
    CODE_FORMAT.is_match(code)
}

/// Normalizes user input (case, stray whitespace) before lookup.
pub fn normalize(code: &str) -> String {
    code.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 9).unwrap()
    }

    #[test]
    fn generated_codes_match_format_and_alphabet() {
        for _ in 0..50 {
            let code = generate(date());
            assert!(validate_format(&code), "{}", code);
            assert!(code.starts_with("SBP-20260309-"));
            let random = &code[13..];
            assert!(random.bytes().all(|b| ALPHABET.contains(&b)), "{}", code);
        }
    }

    #[test]
    fn format_validation() {
        assert!(validate_format("SBP-20260309-AB3CD"));
        assert!(!validate_format("SBP-20260309-AB3CD-7"));
        assert!(!validate_format("sbp-20260309-AB3CD"));
        assert!(!validate_format("SBP-2026039-AB3CD"));
        assert!(!validate_format("SBP-20260309-AB3C"));
    }

    #[test]
    fn normalizes_typed_codes() {
        assert_eq!(normalize("  sbp-20260309-ab3cd "), "SBP-20260309-AB3CD");
        assert!(validate_format(&normalize("sbp-20260309-ab3cd")));
    }
}
