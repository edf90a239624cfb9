use super::ValidationResult;

/// Trims and lowercases; e-mail addresses are stored in this form.
pub fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate(email: &str) -> ValidationResult {
    let email = normalize(email);
    if email.is_empty() {
        return ValidationResult::from_errors(vec!["Email is required".to_string()]);
    }
    if email.len() > 254 || email.chars().any(char::is_whitespace) {
        return ValidationResult::from_errors(vec!["Email address is invalid".to_string()]);
    }
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return ValidationResult::from_errors(vec!["Email address is invalid".to_string()]);
    };
    let domain_ok = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..");
    if local.is_empty() || !domain_ok {
        return ValidationResult::from_errors(vec!["Email address is invalid".to_string()]);
    }
    ValidationResult::ok()
}

pub fn is_valid(email: &str) -> bool {
    validate(email).valid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_addresses() {
        assert!(is_valid("bagisci@example.com"));
        assert!(is_valid("  Ayse.Yilmaz@Vakif.org.tr "));
    }

    #[test]
    fn rejects_malformed_addresses() {
        for bad in ["", "no-at-sign", "a@b", "@example.com", "a@@example.com", "a b@example.com", "a@example..com"] {
            assert!(!is_valid(bad), "{}", bad);
        }
    }

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize(" User@Example.COM "), "user@example.com");
    }
}
