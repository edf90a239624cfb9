//! Owner-side organization lifecycle: register, edit, submit for review

use anyhow::Result;
use tracing::info;

use crate::common::validation::{max_length, require_text};
use crate::common::{ApiError, AuthUser, UserRole};
use crate::domains::organizations::activities::views::load_workspace;
use crate::domains::organizations::data::{
    CreateOrganizationInput, OrganizationWorkspace, UpdateOrganizationInput,
};
use crate::domains::organizations::models::{
    BankAccount, NewOrganization, Organization, OrganizationChanges, OrganizationDocument,
    VerificationStatus,
};
use crate::kernel::ServerDeps;

pub const TAX_NUMBER_LENGTH: usize = 10;

/// Turkish tax numbers (VKN) are exactly ten digits.
pub fn validate_tax_number(tax_number: &str) -> Result<String, ApiError> {
    let normalized: String = tax_number.chars().filter(|c| !c.is_whitespace()).collect();
    if normalized.len() != TAX_NUMBER_LENGTH || !normalized.chars().all(|c| c.is_ascii_digit()) {
        return Err(ApiError::validation(
            "tax_number",
            "Tax number must be exactly 10 digits",
        ));
    }
    Ok(normalized)
}

fn validate_texts(
    legal_name: Option<&str>,
    description: Option<&str>,
    mission_statement: Option<&str>,
) -> Result<(), ApiError> {
    if let Some(name) = legal_name {
        require_text("legal_name", name)?;
        max_length("legal_name", Some(name), 200)?;
    }
    max_length("description", description, 5000)?;
    max_length("mission_statement", mission_statement, 2000)?;
    Ok(())
}

/// The caller's organization, 404 when they have none.
pub async fn require_own_organization(user: &AuthUser, deps: &ServerDeps) -> Result<Organization> {
    let org = Organization::find_by_user(user.user_id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Organization"))?;
    Ok(org)
}

pub async fn create_organization(
    input: CreateOrganizationInput,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<OrganizationWorkspace> {
    if user.role != UserRole::Foundation {
        return Err(ApiError::forbidden("Only foundation accounts can register an organization").into());
    }
    validate_texts(
        Some(&input.legal_name),
        input.description.as_deref(),
        input.mission_statement.as_deref(),
    )?;
    let tax_number = validate_tax_number(&input.tax_number)?;

    if Organization::find_by_user(user.user_id, &deps.db_pool).await?.is_some() {
        return Err(ApiError::conflict("You already have an organization").into());
    }
    if Organization::tax_number_taken(&tax_number, None, &deps.db_pool).await? {
        return Err(ApiError::conflict("Tax number is already registered").into());
    }

    let org = Organization::create(
        NewOrganization {
            user_id: user.user_id,
            organization_type: input.organization_type,
            legal_name: input.legal_name.trim().to_string(),
            trade_name: input.trade_name,
            tax_number,
            derbis_number: input.derbis_number,
            mersis_number: input.mersis_number,
            establishment_date: input.establishment_date,
            description: input.description,
            mission_statement: input.mission_statement,
            logo_url: input.logo_url,
            website_url: input.website_url,
        },
        &deps.db_pool,
    )
    .await?;

    info!(organization_id = %org.id, user_id = %user.user_id, "Organization registered");
    load_workspace(org, deps).await
}

pub async fn get_my_organization(user: &AuthUser, deps: &ServerDeps) -> Result<OrganizationWorkspace> {
    let org = require_own_organization(user, deps).await?;
    load_workspace(org, deps).await
}

pub async fn update_my_organization(
    input: UpdateOrganizationInput,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<OrganizationWorkspace> {
    let org = require_own_organization(user, deps).await?;

    if org.verification_status == VerificationStatus::InReview {
        return Err(ApiError::bad_request("Organization is under review and cannot be edited").into());
    }
    if org.is_approved() && input.touches_legal_identity(&org) {
        return Err(ApiError::bad_request(
            "Legal identity fields cannot be changed after verification",
        )
        .into());
    }

    validate_texts(
        input.legal_name.as_deref(),
        input.description.as_deref(),
        input.mission_statement.as_deref(),
    )?;
    let tax_number = match input.tax_number.as_deref() {
        Some(raw) => {
            let tax_number = validate_tax_number(raw)?;
            if Organization::tax_number_taken(&tax_number, Some(org.id), &deps.db_pool).await? {
                return Err(ApiError::conflict("Tax number is already registered").into());
            }
            Some(tax_number)
        }
        None => None,
    };

    let updated = Organization::update(
        org.id,
        OrganizationChanges {
            organization_type: input.organization_type,
            legal_name: input.legal_name.map(|n| n.trim().to_string()),
            trade_name: input.trade_name,
            tax_number,
            derbis_number: input.derbis_number,
            mersis_number: input.mersis_number,
            establishment_date: input.establishment_date,
            description: input.description,
            mission_statement: input.mission_statement,
            logo_url: input.logo_url,
            website_url: input.website_url,
        },
        &deps.db_pool,
    )
    .await?;

    load_workspace(updated, deps).await
}

/// PENDING or REJECTED to IN_REVIEW. Requires a document and a bank account.
pub async fn submit_for_review(user: &AuthUser, deps: &ServerDeps) -> Result<OrganizationWorkspace> {
    let org = require_own_organization(user, deps).await?;
    if !org.verification_status.can_submit() {
        return Err(ApiError::bad_request(format!(
            "Organization cannot be submitted from status {}",
            org.verification_status
        ))
        .into());
    }
    if OrganizationDocument::count_for_organization(org.id, &deps.db_pool).await? == 0 {
        return Err(ApiError::bad_request("At least one document is required before submission").into());
    }
    if BankAccount::count_for_organization(org.id, &deps.db_pool).await? == 0 {
        return Err(ApiError::bad_request("At least one bank account is required before submission").into());
    }

    let submitted = Organization::submit_for_review(org.id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::conflict("Organization status changed, please retry"))?;

    info!(
        organization_id = %submitted.id,
        resubmission_count = submitted.resubmission_count,
        "Organization submitted for review"
    );
    load_workspace(submitted, deps).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tax_number_must_be_ten_digits() {
        assert_eq!(validate_tax_number("1234567890").unwrap(), "1234567890");
        assert_eq!(validate_tax_number(" 123 456 7890 ").unwrap(), "1234567890");
        assert!(validate_tax_number("123456789").is_err());
        assert!(validate_tax_number("12345678901").is_err());
        assert!(validate_tax_number("12345abcde").is_err());
    }

    #[test]
    fn legal_name_cannot_be_blank() {
        assert!(validate_texts(Some("  "), None, None).is_err());
        assert!(validate_texts(Some("Umut Vakfı"), None, None).is_ok());
        assert!(validate_texts(None, Some(&"x".repeat(5001)), None).is_err());
    }
}
