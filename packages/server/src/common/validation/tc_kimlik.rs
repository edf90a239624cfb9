//! Turkish national identity number (TC Kimlik No) validation.

use super::ValidationResult;

pub fn normalize(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub fn validate(value: &str) -> ValidationResult {
    let tc = normalize(value);
    if tc.len() != 11 || value.chars().any(|c| c.is_alphabetic()) {
        return ValidationResult::from_errors(vec![
            "TC Kimlik No must be exactly 11 digits".to_string(),
        ]);
    }
    if tc.starts_with('0') {
        return ValidationResult::from_errors(vec![
            "TC Kimlik No cannot start with 0".to_string(),
        ]);
    }
    if !check_digits_valid(&tc) {
        return ValidationResult::from_errors(vec![
            "TC Kimlik No check digits are invalid".to_string(),
        ]);
    }
    ValidationResult::ok()
}

pub fn is_valid(value: &str) -> bool {
    validate(value).valid
}

/// Digit 10 is `(7 * sum(odd positions) - sum(even positions)) mod 10` over
/// the first nine digits; digit 11 is the sum of the first ten mod 10.
fn check_digits_valid(tc: &str) -> bool {
    let d: Vec<i32> = tc.bytes().map(|b| (b - b'0') as i32).collect();
    let odd = d[0] + d[2] + d[4] + d[6] + d[8];
    let even = d[1] + d[3] + d[5] + d[7];
    let tenth = (odd * 7 - even).rem_euclid(10);
    let eleventh = d[..10].iter().sum::<i32>() % 10;
    tenth == d[9] && eleventh == d[10]
}

/// `***-***-**46`
pub fn mask(value: &str) -> String {
    let tc = normalize(value);
    if tc.len() != 11 {
        return "***-***-**".to_string();
    }
    format!("***-***-**{}", &tc[9..])
}
