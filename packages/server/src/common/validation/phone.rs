//! Turkish mobile phone numbers, normalized to E.164 (`+905XXXXXXXXX`).

use super::ValidationResult;

fn digits(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// National significant number (`5XXXXXXXXX`) when the input has a
/// recognizable shape.
fn national_number(value: &str) -> Option<String> {
    let digits = digits(value);
    let national = match digits.len() {
        12 if digits.starts_with("90") => &digits[2..],
        11 if digits.starts_with('0') => &digits[1..],
        10 => digits.as_str(),
        _ => return None,
    };
    national.starts_with('5').then(|| national.to_string())
}

pub fn validate(value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return ValidationResult::from_errors(vec!["Phone number is required".to_string()]);
    }
    if value
        .chars()
        .any(|c| !(c.is_ascii_digit() || c.is_whitespace() || "+-()".contains(c)))
    {
        return ValidationResult::from_errors(vec![
            "Phone number contains invalid characters".to_string(),
        ]);
    }
    match national_number(value) {
        Some(_) => ValidationResult::ok(),
        None => ValidationResult::from_errors(vec![
            "Phone number must be a Turkish mobile number (5XX XXX XX XX)".to_string(),
        ]),
    }
}

pub fn is_valid(value: &str) -> bool {
    validate(value).valid
}

pub fn normalize(value: &str) -> Option<String> {
    national_number(value).map(|n| format!("+90{}", n))
}

/// `+90 *** *** ** 67`
pub fn mask(value: &str) -> String {
    match national_number(value) {
        Some(n) => format!("+90 *** *** ** {}", &n[8..]),
        None => "+90 *** *** ** **".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_all_accepted_shapes() {
        for input in ["5321234567", "05321234567", "905321234567", "+90 (532) 123 45 67"] {
            assert_eq!(normalize(input).as_deref(), Some("+905321234567"), "{}", input);
        }
    }

    #[test]
    fn rejects_landlines_and_garbage() {
        assert!(!is_valid("02121234567"));
        assert!(!is_valid("532123456"));
        assert!(!is_valid("532-ABC-4567"));
        assert!(!is_valid(""));
    }

    #[test]
    fn masks_all_but_last_two_digits() {
        assert_eq!(mask("05321234567"), "+90 *** *** ** 67");
    }
}
