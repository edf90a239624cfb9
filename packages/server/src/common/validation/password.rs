//! Password policy.

use super::ValidationResult;

pub const MIN_LENGTH: usize = 8;
pub const MAX_LENGTH: usize = 128;
pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*()-_=+[]{}|;:'\",.<>?/";

pub fn validate(password: &str) -> ValidationResult {
    if password.is_empty() {
        return ValidationResult::from_errors(vec!["Password cannot be empty".to_string()]);
    }

    let mut errors = Vec::new();
    let length = password.chars().count();
    if length < MIN_LENGTH {
        errors.push(format!(
            "Password must be at least {} characters long",
            MIN_LENGTH
        ));
    }
    if length > MAX_LENGTH {
        errors.push(format!("Password must not exceed {} characters", MAX_LENGTH));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("Password must contain at least one uppercase letter (A-Z)".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("Password must contain at least one lowercase letter (a-z)".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain at least one digit (0-9)".to_string());
    }
    if !password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)) {
        errors.push(format!(
            "Password must contain at least one special character ({})",
            SPECIAL_CHARACTERS
        ));
    }
    if password.chars().any(char::is_whitespace) {
        errors.push("Password must not contain whitespace characters".to_string());
    }

    ValidationResult::from_errors(errors)
}

pub fn is_valid(password: &str) -> bool {
    validate(password).valid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_policy_compliant_password() {
        assert!(is_valid("Guvenli1!"));
    }

    #[test]
    fn reports_every_missing_requirement() {
        let result = validate("abc");
        assert!(!result.valid);
        assert!(result.errors.iter().any(|e| e.contains("at least 8")));
        assert!(result.errors.iter().any(|e| e.contains("uppercase")));
        assert!(result.errors.iter().any(|e| e.contains("digit")));
        assert!(result.errors.iter().any(|e| e.contains("special")));
        assert!(!result.errors.iter().any(|e| e.contains("lowercase")));
    }

    #[test]
    fn rejects_whitespace_and_overlong_passwords() {
        assert!(!is_valid("Guvenli 1!"));
        let long = format!("Aa1!{}", "x".repeat(MAX_LENGTH));
        assert!(validate(&long).errors.iter().any(|e| e.contains("exceed")));
    }

    #[test]
    fn empty_password_has_single_error() {
        assert_eq!(validate("").errors.len(), 1);
    }
}
