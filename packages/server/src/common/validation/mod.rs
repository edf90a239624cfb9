//! Input validators for Turkish identifiers and credentials.
//!
//! Each validator normalizes its input first (strip separators, fix case) and
//! reports every problem it finds instead of stopping at the first one.

pub mod email;
pub mod iban;
pub mod password;
pub mod phone;
pub mod tc_kimlik;

use serde::Serialize;

use super::error::ApiError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    pub fn first_error(&self) -> Option<&str> {
        self.errors.first().map(String::as_str)
    }

    /// Converts a failed result into a field-level `ApiError`.
    pub fn into_api_result(self, field: &str) -> Result<(), ApiError> {
        if self.valid {
            return Ok(());
        }
        Err(ApiError::validation(
            field,
            self.errors.join("; "),
        ))
    }
}

/// Rejects blank required text fields.
pub fn require_text(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(field, format!("{} is required", field)));
    }
    Ok(())
}

/// Rejects text longer than `max` characters.
pub fn max_length(field: &str, value: Option<&str>, max: usize) -> Result<(), ApiError> {
    match value {
        Some(v) if v.chars().count() > max => Err(ApiError::validation(
            field,
            format!("{} must be at most {} characters", field, max),
        )),
        _ => Ok(()),
    }
}

/// Trimmed http(s) URL.
pub fn http_url(field: &str, value: &str) -> Result<String, ApiError> {
    let url = value.trim();
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(ApiError::validation(
            field,
            format!("{} must be an http(s) URL", field),
        ));
    }
    max_length(field, Some(url), 2048)?;
    Ok(url.to_string())
}
