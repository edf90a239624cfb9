//! Transparency score activities.
//!
//! All writes lock the organization's score row (`FOR UPDATE`) and write the
//! history entry in the same transaction, so concurrent events serialize.

use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use sqlx::PgConnection;
use tracing::{info, warn};

use crate::common::{
    AdminCapability, ApiError, AuthUser, CampaignId, EvidenceId, OrganizationId, PageParams,
    Paged, RequestMeta,
};
use crate::domains::audit::{self, AuditAction, AuditEntry};
use crate::domains::campaigns::models::Campaign;
use crate::domains::organizations::models::{Organization, VerificationStatus};
use crate::domains::transparency::calculator::{self, ScoreEvent};
use crate::domains::transparency::models::{ScoreHistory, TransparencyScore};
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, Serialize)]
pub struct TransparencyScoreData {
    pub organization_id: OrganizationId,
    pub current_score: Decimal,
    pub level: &'static str,
    pub total_campaigns: i32,
    pub completed_campaigns: i32,
    pub on_time_reports: i32,
    pub late_reports: i32,
    pub approved_evidences: i32,
    pub rejected_evidences: i32,
    pub last_calculated_at: DateTime<Utc>,
}

impl From<TransparencyScore> for TransparencyScoreData {
    fn from(score: TransparencyScore) -> Self {
        Self {
            organization_id: score.organization_id,
            level: calculator::level(score.current_score),
            current_score: score.current_score,
            total_campaigns: score.total_campaigns,
            completed_campaigns: score.completed_campaigns,
            on_time_reports: score.on_time_reports,
            late_reports: score.late_reports,
            approved_evidences: score.approved_evidences,
            rejected_evidences: score.rejected_evidences,
            last_calculated_at: score.last_calculated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub rank: i64,
    pub organization_id: OrganizationId,
    pub organization_name: String,
    pub logo_url: Option<String>,
    pub current_score: Decimal,
    pub level: &'static str,
    pub completed_campaigns: i32,
}

/// Creates the 50-point starting score inside an open transaction.
/// Idempotent: an existing score is returned untouched.
pub async fn initialize_score_in(
    organization_id: OrganizationId,
    conn: &mut PgConnection,
) -> Result<TransparencyScore> {
    let initial = calculator::initial_score();
    match TransparencyScore::insert_initial(organization_id, initial, &mut *conn).await? {
        Some(score) => {
            ScoreHistory::insert(
                organization_id,
                None,
                initial,
                ScoreEvent::InitialScore,
                None,
                None,
                &mut *conn,
            )
            .await?;
            info!(organization_id = %organization_id, "Transparency score initialized");
            Ok(score)
        }
        None => TransparencyScore::lock(organization_id, conn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Transparency score vanished for {}", organization_id)),
    }
}

pub async fn initialize_score(
    organization_id: OrganizationId,
    deps: &ServerDeps,
) -> Result<TransparencyScore> {
    let mut tx = deps.db_pool.begin().await?;
    let score = initialize_score_in(organization_id, &mut tx).await?;
    tx.commit().await?;
    Ok(score)
}

/// Applies one event inside an open transaction.
pub async fn apply_event_in(
    organization_id: OrganizationId,
    event: ScoreEvent,
    campaign_id: Option<CampaignId>,
    evidence_id: Option<EvidenceId>,
    conn: &mut PgConnection,
) -> Result<TransparencyScore> {
    let current = match TransparencyScore::lock(organization_id, &mut *conn).await? {
        Some(score) => score,
        None => initialize_score_in(organization_id, &mut *conn).await?,
    };

    let new_score = calculator::apply(current.current_score, event);
    ScoreHistory::insert(
        organization_id,
        Some(current.current_score),
        new_score,
        event,
        campaign_id,
        evidence_id,
        &mut *conn,
    )
    .await?;
    let updated =
        TransparencyScore::apply_change(organization_id, new_score, event.counter_delta(), conn)
            .await?;

    info!(
        organization_id = %organization_id,
        event = %event,
        previous = %current.current_score,
        new = %new_score,
        "Transparency score changed"
    );
    Ok(updated)
}

/// Missing score counts as not eligible.
pub async fn can_create_campaign(organization_id: OrganizationId, deps: &ServerDeps) -> Result<bool> {
    Ok(
        TransparencyScore::find_by_organization(organization_id, &deps.db_pool)
            .await?
            .map_or(false, |s| calculator::meets_campaign_threshold(s.current_score)),
    )
}

/// Replays the history log and overwrites the stored score and counters.
pub async fn recalculate(
    organization_id: OrganizationId,
    admin: &AuthUser,
    meta: &RequestMeta,
    deps: &ServerDeps,
) -> Result<TransparencyScoreData> {
    admin
        .actor()
        .can(AdminCapability::VerifyOrganizations)
        .check(deps)
        .await?;
    Organization::find_by_id_optional(organization_id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Organization"))?;

    let mut tx = deps.db_pool.begin().await?;
    let before = match TransparencyScore::lock(organization_id, &mut tx).await? {
        Some(score) => score,
        None => initialize_score_in(organization_id, &mut tx).await?,
    };

    let mut events = Vec::new();
    for reason in ScoreHistory::reasons_in_order(organization_id, &mut tx).await? {
        match reason.parse::<ScoreEvent>() {
            Ok(event) => events.push(event),
            Err(_) => warn!(organization_id = %organization_id, reason = %reason, "Skipping unknown score history reason"),
        }
    }
    let (score, counters) = calculator::replay(events);
    let total_campaigns = Campaign::count_for_organization(organization_id, &mut tx).await?;
    let after = TransparencyScore::overwrite(
        organization_id,
        score,
        counters,
        total_campaigns as i32,
        &mut tx,
    )
    .await?;
    tx.commit().await?;

    info!(organization_id = %organization_id, previous = %before.current_score, new = %after.current_score, "Transparency score recalculated");
    audit::record(
        AuditEntry::builder()
            .user_id(admin.user_id)
            .action(AuditAction::TransparencyRecalculate)
            .entity_type("organization")
            .entity_id(organization_id.into_uuid())
            .old_values(json!({ "score": before.current_score }))
            .new_values(json!({ "score": after.current_score }))
            .meta(meta.clone())
            .build(),
        deps,
    )
    .await;

    Ok(after.into())
}

async fn require_public_organization(
    organization_id: OrganizationId,
    deps: &ServerDeps,
) -> Result<()> {
    let org = Organization::find_by_id_optional(organization_id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Organization"))?;
    if org.verification_status != VerificationStatus::Approved {
        return Err(ApiError::not_found("Organization").into());
    }
    Ok(())
}

pub async fn get_score(
    organization_id: OrganizationId,
    deps: &ServerDeps,
) -> Result<TransparencyScoreData> {
    require_public_organization(organization_id, deps).await?;
    let score = TransparencyScore::find_by_organization(organization_id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Transparency score"))?;
    Ok(score.into())
}

pub async fn get_history(
    organization_id: OrganizationId,
    page: PageParams,
    deps: &ServerDeps,
) -> Result<Paged<ScoreHistory>> {
    require_public_organization(organization_id, deps).await?;
    let items = ScoreHistory::find_for_organization(
        organization_id,
        page.limit(),
        page.offset(),
        &deps.db_pool,
    )
    .await?;
    let total = ScoreHistory::count_for_organization(organization_id, &deps.db_pool).await?;
    Ok(Paged::new(items, page, total))
}

pub async fn leaderboard(page: PageParams, deps: &ServerDeps) -> Result<Paged<LeaderboardEntry>> {
    let rows = TransparencyScore::leaderboard(page.limit(), page.offset(), &deps.db_pool).await?;
    let total = TransparencyScore::leaderboard_count(&deps.db_pool).await?;
    let first_rank = page.offset() + 1;
    let items = rows
        .into_iter()
        .enumerate()
        .map(|(index, row)| LeaderboardEntry {
            rank: first_rank + index as i64,
            organization_id: row.organization_id,
            organization_name: row.legal_name,
            logo_url: row.logo_url,
            level: calculator::level(row.current_score),
            current_score: row.current_score,
            completed_campaigns: row.completed_campaigns,
        })
        .collect();
    Ok(Paged::new(items, page, total))
}
