use anyhow::Result;
use serde_json::json;
use tracing::info;

use crate::common::{AdminCapability, ApiError, AuthUser, EvidenceId, PageParams, Paged, RequestMeta};
use crate::domains::audit::{self, AuditAction, AuditEntry};
use crate::domains::campaigns::activities::views::find_campaign;
use crate::domains::evidence::data::{EvidenceStatusQuery, ReviewEvidenceInput};
use crate::domains::evidence::models::{Evidence, EvidenceStatus};
use crate::domains::notifications::{self, NotificationType};
use crate::domains::organizations::models::Organization;
use crate::domains::transparency::{self, ScoreEvent};
use crate::kernel::ServerDeps;

pub async fn admin_list_evidences(
    query: EvidenceStatusQuery,
    page: PageParams,
    admin: &AuthUser,
    deps: &ServerDeps,
) -> Result<Paged<Evidence>> {
    admin
        .actor()
        .can(AdminCapability::ReviewEvidence)
        .check(deps)
        .await?;
    let items =
        Evidence::find_by_status(query.status, page.limit(), page.offset(), &deps.db_pool).await?;
    let total = Evidence::count_by_status(query.status, &deps.db_pool).await?;
    Ok(Paged::new(items, page, total))
}

/// Event for an approval: on time when uploaded before the campaign's
/// evidence deadline.
pub fn approval_event(on_time: bool) -> ScoreEvent {
    if on_time {
        ScoreEvent::EvidenceApprovedOnTime
    } else {
        ScoreEvent::EvidenceApprovedLate
    }
}

/// Approves or rejects a pending evidence. The status change and the
/// transparency event commit together.
pub async fn review_evidence(
    id: EvidenceId,
    input: ReviewEvidenceInput,
    admin: &AuthUser,
    meta: &RequestMeta,
    deps: &ServerDeps,
) -> Result<Evidence> {
    admin
        .actor()
        .can(AdminCapability::ReviewEvidence)
        .check(deps)
        .await?;

    let reason = input
        .rejection_reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());
    if !input.approved && reason.is_none() {
        return Err(ApiError::validation("rejection_reason", "Rejection reason is required").into());
    }

    let evidence = Evidence::find_by_id_optional(id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Evidence"))?;
    if evidence.status != EvidenceStatus::Pending {
        return Err(ApiError::bad_request("Only pending evidence can be reviewed").into());
    }
    let campaign = find_campaign(evidence.campaign_id, deps).await?;
    let org = Organization::find_by_id(campaign.organization_id, &deps.db_pool).await?;

    let (status, event, audit_action) = if input.approved {
        let on_time = evidence.is_on_time(campaign.evidence_deadline());
        (EvidenceStatus::Approved, approval_event(on_time), AuditAction::EvidenceApprove)
    } else {
        (EvidenceStatus::Rejected, ScoreEvent::EvidenceRejected, AuditAction::EvidenceReject)
    };

    let mut tx = deps.db_pool.begin().await?;
    let reviewed = Evidence::review(id, status, admin.user_id, reason.as_deref(), &mut tx)
        .await?
        .ok_or_else(|| ApiError::conflict("Evidence was reviewed concurrently"))?;
    transparency::activities::apply_event_in(org.id, event, Some(campaign.id), Some(id), &mut tx)
        .await?;
    tx.commit().await?;

    info!(evidence_id = %id, status = ?status, event = %event, "Evidence reviewed");
    audit::record(
        AuditEntry::builder()
            .user_id(admin.user_id)
            .action(audit_action)
            .entity_type("evidence")
            .entity_id(id.into_uuid())
            .old_values(json!({ "status": evidence.status }))
            .new_values(json!({
                "status": reviewed.status,
                "rejection_reason": reviewed.rejection_reason,
                "score_event": event.as_str(),
            }))
            .meta(meta.clone())
            .build(),
        deps,
    )
    .await;

    let (kind, title, message) = if input.approved {
        (
            NotificationType::EvidenceApproved,
            "Harcama kanıtı onaylandı",
            format!("\"{}\" başlıklı kanıtınız onaylandı.", reviewed.title),
        )
    } else {
        (
            NotificationType::EvidenceRejected,
            "Harcama kanıtı reddedildi",
            format!(
                "\"{}\" başlıklı kanıtınız reddedildi: {}",
                reviewed.title,
                reviewed.rejection_reason.as_deref().unwrap_or_default()
            ),
        )
    };
    notifications::notify(
        org.user_id,
        kind,
        title,
        &message,
        Some(json!({ "evidence_id": id, "campaign_id": campaign.id })),
        deps,
    )
    .await;

    Ok(reviewed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn late_approvals_score_less() {
        assert_eq!(approval_event(true), ScoreEvent::EvidenceApprovedOnTime);
        assert_eq!(approval_event(false), ScoreEvent::EvidenceApprovedLate);
        assert!(
            approval_event(true).change_amount() > approval_event(false).change_amount()
        );
    }
}
