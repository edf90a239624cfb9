//! Bank accounts, contacts and documents attached to the caller's organization

use anyhow::Result;
use tracing::info;

use crate::common::validation::{email, iban, max_length, phone, require_text};
use crate::common::{ApiError, AuthUser, BankAccountId, ContactId, DocumentId};
use crate::domains::organizations::activities::profile::require_own_organization;
use crate::domains::organizations::data::{
    CreateBankAccountInput, CreateContactInput, CreateDocumentInput,
};
use crate::domains::organizations::models::{BankAccount, OrganizationContact, OrganizationDocument};
use crate::kernel::ServerDeps;

const DEFAULT_CURRENCY: &str = "TRY";

// =============================================================================
// Bank accounts
// =============================================================================

pub async fn list_bank_accounts(user: &AuthUser, deps: &ServerDeps) -> Result<Vec<BankAccount>> {
    let org = require_own_organization(user, deps).await?;
    BankAccount::find_for_organization(org.id, &deps.db_pool).await
}

pub async fn add_bank_account(
    input: CreateBankAccountInput,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<BankAccount> {
    let org = require_own_organization(user, deps).await?;

    require_text("bank_name", &input.bank_name)?;
    require_text("account_holder", &input.account_holder)?;
    max_length("bank_name", Some(&input.bank_name), 100)?;
    iban::validate(&input.iban).into_api_result("iban")?;
    let normalized = iban::normalize(&input.iban);
    let currency = input
        .currency
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

    let existing = BankAccount::find_for_organization(org.id, &deps.db_pool).await?;
    if existing.iter().any(|a| a.iban == normalized) {
        return Err(ApiError::conflict("This IBAN is already registered").into());
    }

    let mut conn = deps.db_pool.acquire().await?;
    let account = BankAccount::create(
        org.id,
        input.bank_name.trim(),
        input.branch_name.as_deref(),
        input.account_holder.trim(),
        &normalized,
        &currency,
        &mut conn,
    )
    .await?;

    info!(
        organization_id = %org.id,
        bank_account_id = %account.id,
        iban = %iban::mask(&account.iban),
        "Bank account added"
    );
    Ok(account)
}

pub async fn set_primary_bank_account(
    id: BankAccountId,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<BankAccount> {
    let org = require_own_organization(user, deps).await?;

    let mut tx = deps.db_pool.begin().await?;
    BankAccount::find_owned(id, org.id, &mut tx)
        .await?
        .ok_or_else(|| ApiError::not_found("Bank account"))?;
    let account = BankAccount::set_primary(id, org.id, &mut tx).await?;
    tx.commit().await?;

    Ok(account)
}

/// Deleting the primary account promotes the oldest remaining one.
pub async fn delete_bank_account(id: BankAccountId, user: &AuthUser, deps: &ServerDeps) -> Result<()> {
    let org = require_own_organization(user, deps).await?;

    let mut tx = deps.db_pool.begin().await?;
    let account = BankAccount::find_owned(id, org.id, &mut tx)
        .await?
        .ok_or_else(|| ApiError::not_found("Bank account"))?;
    BankAccount::delete(id, &mut tx).await?;
    if account.is_primary {
        BankAccount::promote_oldest(org.id, &mut tx).await?;
    }
    tx.commit().await?;

    info!(
        organization_id = %org.id,
        bank_account_id = %id,
        iban = %iban::mask(&account.iban),
        promoted = account.is_primary,
        "Bank account deleted"
    );
    Ok(())
}

// =============================================================================
// Contacts
// =============================================================================

pub async fn list_contacts(user: &AuthUser, deps: &ServerDeps) -> Result<Vec<OrganizationContact>> {
    let org = require_own_organization(user, deps).await?;
    OrganizationContact::find_for_organization(org.id, &deps.db_pool).await
}

pub async fn add_contact(
    input: CreateContactInput,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<OrganizationContact> {
    let org = require_own_organization(user, deps).await?;

    require_text("contact_type", &input.contact_type)?;
    require_text("contact_name", &input.contact_name)?;
    let contact_email = match input.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        Some(raw) => {
            email::validate(raw).into_api_result("email")?;
            Some(email::normalize(raw))
        }
        None => None,
    };
    let contact_phone = match input.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        Some(raw) => {
            phone::validate(raw).into_api_result("phone")?;
            phone::normalize(raw)
        }
        None => None,
    };

    OrganizationContact::create(
        org.id,
        input.contact_type.trim(),
        input.contact_name.trim(),
        contact_email.as_deref(),
        contact_phone.as_deref(),
        input.is_primary,
        &deps.db_pool,
    )
    .await
}

pub async fn delete_contact(id: ContactId, user: &AuthUser, deps: &ServerDeps) -> Result<()> {
    let org = require_own_organization(user, deps).await?;
    if !OrganizationContact::delete(id, org.id, &deps.db_pool).await? {
        return Err(ApiError::not_found("Contact").into());
    }
    Ok(())
}

// =============================================================================
// Documents
// =============================================================================

pub async fn list_documents(user: &AuthUser, deps: &ServerDeps) -> Result<Vec<OrganizationDocument>> {
    let org = require_own_organization(user, deps).await?;
    OrganizationDocument::find_for_organization(org.id, &deps.db_pool).await
}

pub async fn add_document(
    input: CreateDocumentInput,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<OrganizationDocument> {
    let org = require_own_organization(user, deps).await?;

    require_text("document_type", &input.document_type)?;
    require_text("document_name", &input.document_name)?;
    require_text("file_url", &input.file_url)?;
    if !input.file_url.starts_with("https://") && !input.file_url.starts_with("http://") {
        return Err(ApiError::validation("file_url", "file_url must be an http(s) URL").into());
    }

    OrganizationDocument::create(
        org.id,
        input.document_type.trim(),
        input.document_name.trim(),
        input.file_url.trim(),
        &deps.db_pool,
    )
    .await
}

/// Documents of an approved organization are part of its verification record.
pub async fn delete_document(id: DocumentId, user: &AuthUser, deps: &ServerDeps) -> Result<()> {
    let org = require_own_organization(user, deps).await?;
    if org.is_approved() {
        return Err(ApiError::bad_request("Documents of a verified organization cannot be deleted").into());
    }
    if !OrganizationDocument::delete(id, org.id, &deps.db_pool).await? {
        return Err(ApiError::not_found("Document").into());
    }
    Ok(())
}
