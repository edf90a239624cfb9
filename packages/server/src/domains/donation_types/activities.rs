use anyhow::Result;

use crate::common::ApiError;
use crate::domains::donation_types::models::DonationType;
use crate::kernel::ServerDeps;

/// `zakat`, ` Zakat ` and `ZAKAT` all name the same type.
pub fn normalize_code(raw: &str) -> Result<String, ApiError> {
    let code = raw.trim().to_uppercase();
    if code.is_empty() || !code.chars().all(|c| c.is_ascii_uppercase() || c == '_') {
        return Err(ApiError::not_found("Donation type"));
    }
    Ok(code)
}

pub async fn list_donation_types(deps: &ServerDeps) -> Result<Vec<DonationType>> {
    DonationType::find_all(&deps.db_pool).await
}

pub async fn active_donation_types(deps: &ServerDeps) -> Result<Vec<DonationType>> {
    DonationType::find_active(&deps.db_pool).await
}

pub async fn get_donation_type(code: &str, deps: &ServerDeps) -> Result<DonationType> {
    let donation_type = DonationType::find_by_code(&normalize_code(code)?, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Donation type"))?;
    Ok(donation_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_case_insensitive() {
        assert_eq!(normalize_code(" zakat ").unwrap(), "ZAKAT");
        assert_eq!(normalize_code("Sadaqah").unwrap(), "SADAQAH");
    }

    #[test]
    fn odd_codes_are_simply_missing() {
        for raw in ["", "zak at", "fitra'--", "ğ"] {
            assert!(matches!(normalize_code(raw), Err(ApiError::NotFound(_))));
        }
    }
}
