//! Owner side: uploading, editing and browsing spending evidence.

use anyhow::Result;
use tracing::info;

use crate::common::validation::{max_length, require_text};
use crate::common::{
    ApiError, AuthUser, CampaignId, EvidenceDocumentId, EvidenceId, PageParams, Paged,
};
use crate::domains::campaigns::activities::views::{ensure_visible, find_campaign, find_owned_campaign};
use crate::domains::campaigns::models::{Campaign, CampaignStatus};
use crate::domains::evidence::data::{
    check_amount_spent, check_within_collected, CreateEvidenceInput, DocumentInput,
    EvidenceDetail, MyEvidenceQuery, UpdateEvidenceInput,
};
use crate::domains::evidence::models::{
    Evidence, EvidenceChanges, EvidenceDocument, EvidenceStatus, NewEvidence,
    NewEvidenceDocument,
};
use crate::domains::organizations::models::Organization;
use crate::kernel::ServerDeps;

fn validate_documents(documents: &[DocumentInput]) -> Result<Vec<NewEvidenceDocument>> {
    let mut validated = Vec::with_capacity(documents.len());
    for doc in documents {
        validated.push(doc.validate()?);
    }
    Ok(validated)
}

fn clean(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub async fn create_evidence(
    input: CreateEvidenceInput,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<EvidenceDetail> {
    require_text("title", &input.title)?;
    max_length("title", Some(&input.title), 200)?;
    check_amount_spent(input.amount_spent)?;
    let documents = validate_documents(&input.documents)?;

    let (campaign, _) = find_owned_campaign(input.campaign_id, user, false, deps).await?;
    if campaign.status != CampaignStatus::Completed {
        return Err(ApiError::bad_request("Evidence can only be added to completed campaigns").into());
    }

    let mut tx = deps.db_pool.begin().await?;
    // Serializes concurrent uploads against the same collected amount.
    let locked = Campaign::lock(campaign.id, &mut tx)
        .await?
        .ok_or_else(|| ApiError::not_found("Campaign"))?;
    let claimed = Evidence::claimed_total(campaign.id, None, &mut tx).await?;
    check_within_collected(claimed, input.amount_spent, locked.collected_amount)?;

    let evidence = Evidence::create(
        NewEvidence {
            campaign_id: campaign.id,
            evidence_type: input.evidence_type,
            title: input.title.trim().to_string(),
            description: clean(input.description),
            amount_spent: input.amount_spent,
            spend_date: input.spend_date,
            vendor_name: clean(input.vendor_name),
            vendor_tax_number: clean(input.vendor_tax_number),
            invoice_number: clean(input.invoice_number),
            uploaded_by: user.user_id,
        },
        &mut tx,
    )
    .await?;
    let mut stored = Vec::with_capacity(documents.len());
    for doc in &documents {
        stored.push(EvidenceDocument::create(evidence.id, doc, &mut tx).await?);
    }
    tx.commit().await?;

    info!(
        evidence_id = %evidence.id,
        campaign_id = %campaign.id,
        amount_spent = %evidence.amount_spent,
        "Evidence uploaded"
    );
    Ok(EvidenceDetail {
        evidence,
        documents: stored,
    })
}

/// Loads an evidence the caller may change: they own the campaign and the
/// record is not approved yet.
async fn find_editable(
    id: EvidenceId,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<(Evidence, Campaign)> {
    let evidence = Evidence::find_by_id_optional(id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Evidence"))?;
    let (campaign, _) = find_owned_campaign(evidence.campaign_id, user, false, deps).await?;
    if !evidence.status.is_editable() {
        return Err(ApiError::bad_request("Approved evidence cannot be changed").into());
    }
    Ok((evidence, campaign))
}

pub async fn update_evidence(
    id: EvidenceId,
    input: UpdateEvidenceInput,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<EvidenceDetail> {
    if let Some(title) = &input.title {
        require_text("title", title)?;
        max_length("title", Some(title), 200)?;
    }
    if let Some(amount) = input.amount_spent {
        check_amount_spent(amount)?;
    }
    let documents = validate_documents(&input.documents)?;
    let (evidence, campaign) = find_editable(id, user, deps).await?;

    let mut tx = deps.db_pool.begin().await?;
    let locked = Campaign::lock(campaign.id, &mut tx)
        .await?
        .ok_or_else(|| ApiError::not_found("Campaign"))?;
    let amount = input.amount_spent.unwrap_or(evidence.amount_spent);
    let claimed = Evidence::claimed_total(campaign.id, Some(id), &mut tx).await?;
    check_within_collected(claimed, amount, locked.collected_amount)?;

    let updated = Evidence::update(
        id,
        EvidenceChanges {
            evidence_type: input.evidence_type,
            title: input.title.map(|t| t.trim().to_string()),
            description: clean(input.description),
            amount_spent: input.amount_spent,
            spend_date: input.spend_date,
            vendor_name: clean(input.vendor_name),
            vendor_tax_number: clean(input.vendor_tax_number),
            invoice_number: clean(input.invoice_number),
        },
        &mut tx,
    )
    .await?
    .ok_or_else(|| ApiError::bad_request("Approved evidence cannot be changed"))?;
    for doc in &documents {
        EvidenceDocument::create(id, doc, &mut tx).await?;
    }
    tx.commit().await?;

    if evidence.status == EvidenceStatus::Rejected {
        info!(evidence_id = %id, "Rejected evidence resubmitted");
    }
    let documents = EvidenceDocument::find_for_evidence(id, &deps.db_pool).await?;
    Ok(EvidenceDetail {
        evidence: updated,
        documents,
    })
}

pub async fn delete_evidence(id: EvidenceId, user: &AuthUser, deps: &ServerDeps) -> Result<()> {
    find_editable(id, user, deps).await?;
    if !Evidence::delete(id, &deps.db_pool).await? {
        return Err(ApiError::bad_request("Approved evidence cannot be deleted").into());
    }
    info!(evidence_id = %id, "Evidence deleted");
    Ok(())
}

pub async fn add_document(
    id: EvidenceId,
    input: DocumentInput,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<EvidenceDocument> {
    let document = input.validate()?;
    find_editable(id, user, deps).await?;
    let mut conn = deps.db_pool.acquire().await?;
    EvidenceDocument::create(id, &document, &mut conn).await
}

pub async fn remove_document(
    id: EvidenceId,
    document_id: EvidenceDocumentId,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<()> {
    find_editable(id, user, deps).await?;
    if !EvidenceDocument::delete(document_id, id, &deps.db_pool).await? {
        return Err(ApiError::not_found("Document").into());
    }
    Ok(())
}

pub async fn my_evidences(
    query: MyEvidenceQuery,
    page: PageParams,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<Paged<Evidence>> {
    let items = Evidence::find_for_uploader(
        user.user_id,
        query.campaign_id,
        page.limit(),
        page.offset(),
        &deps.db_pool,
    )
    .await?;
    let total = Evidence::count_for_uploader(user.user_id, query.campaign_id, &deps.db_pool).await?;
    Ok(Paged::new(items, page, total))
}

/// Approved evidence is public. Anything else is visible to the uploader,
/// the owning organization and admins.
pub async fn get_evidence(
    id: EvidenceId,
    viewer: Option<&AuthUser>,
    deps: &ServerDeps,
) -> Result<EvidenceDetail> {
    let evidence = Evidence::find_by_id_optional(id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Evidence"))?;

    if evidence.status != EvidenceStatus::Approved {
        let allowed = match viewer {
            Some(user) if user.is_admin() || user.user_id == evidence.uploaded_by => true,
            Some(user) => {
                let campaign = find_campaign(evidence.campaign_id, deps).await?;
                let org = Organization::find_by_id(campaign.organization_id, &deps.db_pool).await?;
                org.user_id == user.user_id
            }
            None => false,
        };
        if !allowed {
            return Err(ApiError::not_found("Evidence").into());
        }
    }

    let documents = EvidenceDocument::find_for_evidence(id, &deps.db_pool).await?;
    Ok(EvidenceDetail {
        evidence,
        documents,
    })
}

pub async fn campaign_evidences(
    campaign_id: CampaignId,
    page: PageParams,
    viewer: Option<&AuthUser>,
    deps: &ServerDeps,
) -> Result<Paged<Evidence>> {
    let campaign = find_campaign(campaign_id, deps).await?;
    let org = Organization::find_by_id(campaign.organization_id, &deps.db_pool).await?;
    ensure_visible(&campaign, &org, viewer)?;

    let items = Evidence::find_approved_for_campaign(
        campaign.id,
        page.limit(),
        page.offset(),
        &deps.db_pool,
    )
    .await?;
    let total = Evidence::count_approved_for_campaign(campaign.id, &deps.db_pool).await?;
    Ok(Paged::new(items, page, total))
}
