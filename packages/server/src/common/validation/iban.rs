//! Turkish IBAN validation (ISO 13616, mod-97).

use super::ValidationResult;

pub const TR_IBAN_LENGTH: usize = 26;
const COUNTRY_CODE: &str = "TR";

/// Strips spaces and dashes and uppercases.
pub fn normalize(iban: &str) -> String {
    iban.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect::<String>()
        .to_uppercase()
}

pub fn validate(iban: &str) -> ValidationResult {
    let iban = normalize(iban);
    if iban.is_empty() {
        return ValidationResult::from_errors(vec!["IBAN is required".to_string()]);
    }

    let mut errors = Vec::new();
    if !iban.starts_with(COUNTRY_CODE) {
        errors.push("IBAN must be a Turkish IBAN starting with TR".to_string());
    }
    if iban.len() != TR_IBAN_LENGTH {
        errors.push(format!(
            "IBAN must be {} characters long, got {}",
            TR_IBAN_LENGTH,
            iban.len()
        ));
    }
    if !iban.chars().all(|c| c.is_ascii_alphanumeric()) {
        errors.push("IBAN may only contain letters and digits".to_string());
    }
    if errors.is_empty() && !checksum_valid(&iban) {
        errors.push("IBAN checksum is invalid".to_string());
    }

    ValidationResult::from_errors(errors)
}

pub fn is_valid(iban: &str) -> bool {
    validate(iban).valid
}

/// Moves the first four characters to the end, maps letters to 10..=35 and
/// checks that the resulting number is 1 modulo 97.
fn checksum_valid(iban: &str) -> bool {
    let rearranged = iban[4..].chars().chain(iban[..4].chars());
    let mut remainder: u32 = 0;
    for c in rearranged {
        let Some(value) = c.to_digit(36) else {
            return false;
        };
        remainder = if value < 10 {
            (remainder * 10 + value) % 97
        } else {
            (remainder * 100 + value) % 97
        };
    }
    remainder == 1
}

/// Groups a normalized IBAN by four: `TR33 0006 1005 1978 6457 8413 26`.
pub fn format(iban: &str) -> String {
    let iban = normalize(iban);
    iban.chars()
        .collect::<Vec<_>>()
        .chunks(4)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalized IBAN when it has the right shape for byte slicing.
fn ascii_normalized(iban: &str) -> Option<String> {
    let iban = normalize(iban);
    (iban.len() == TR_IBAN_LENGTH && iban.chars().all(|c| c.is_ascii_alphanumeric()))
        .then_some(iban)
}

/// Keeps the country/check digits and the last six characters.
pub fn mask(iban: &str) -> String {
    match ascii_normalized(iban) {
        Some(iban) => format!("{} **** **** **{}", &iban[..4], &iban[20..]),
        None => "****".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "TR330006100519786457841326";

    #[test]
    fn accepts_valid_iban_in_any_layout() {
        assert!(is_valid(VALID));
        assert!(is_valid("tr33 0006 1005 1978 6457 8413 26"));
        assert!(is_valid("TR32-0010-0099-9990-1234-5678-90"));
    }

    #[test]
    fn rejects_wrong_length() {
        let result = validate("TR33000610051978645784132");
        assert!(!result.valid);
        assert!(result.first_error().unwrap().contains("26"));
    }

    #[test]
    fn rejects_foreign_iban() {
        let result = validate("DE89370400440532013000");
        assert!(!result.valid);
        assert!(result.errors.iter().any(|e| e.contains("TR")));
    }

    #[test]
    fn rejects_bad_checksum() {
        let result = validate("TR330006100519786457841327");
        assert_eq!(result.errors, vec!["IBAN checksum is invalid".to_string()]);
    }

    #[test]
    fn rejects_empty_input() {
        assert!(!is_valid("   "));
    }

    #[test]
    fn formats_and_masks() {
        assert_eq!(format(VALID), "TR33 0006 1005 1978 6457 8413 26");
        assert_eq!(mask(VALID), "TR33 **** **** **841326");
        assert_eq!(mask("TR33"), "****");
    }

    #[test]
    fn non_ascii_input_is_masked_without_panicking() {
        // 26 bytes, but 'Ş' spans two of them
        let input = "TR33 0006 1005 1978 6457 8413 Ş";
        assert_eq!(normalize(input).len(), TR_IBAN_LENGTH);
        assert_eq!(mask(input), "****");
        assert_eq!(mask("TRÇÇ00061005197864578413"), "****");
        assert!(!is_valid(input));
    }
}
