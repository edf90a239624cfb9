use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::common::{AdminCapability, AuthUser, UserRole};
use crate::domains::auth::models::User;
use crate::domains::campaigns::models::{Campaign, CampaignStatus};
use crate::domains::donations::models::{BankTransferReference, Donation, DonationTotals};
use crate::domains::evidence::models::{Evidence, EvidenceStatus};
use crate::domains::organizations::models::{Organization, VerificationStatus};
use crate::domains::reports::models::Report;
use crate::kernel::ServerDeps;

/// Window for the "recent donations" figures
pub const RECENT_DONATION_DAYS: i64 = 30;

#[derive(Debug, Clone, Serialize)]
pub struct StatusCount<S> {
    pub status: S,
    pub count: i64,
}

fn status_counts<S>(rows: Vec<(S, i64)>) -> Vec<StatusCount<S>> {
    rows.into_iter()
        .map(|(status, count)| StatusCount { status, count })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_users: i64,
    pub users_by_role: Vec<StatusCount<UserRole>>,
    pub organizations_by_status: Vec<StatusCount<VerificationStatus>>,
    pub campaigns_by_status: Vec<StatusCount<CampaignStatus>>,
    pub pending_evidences: i64,
    pub open_reports: i64,
    pub pending_bank_transfers: i64,
    pub donations: DonationTotals,
    pub recent_donations: DonationTotals,
    pub generated_at: DateTime<Utc>,
}

pub async fn dashboard(admin: &AuthUser, deps: &ServerDeps) -> Result<DashboardStats> {
    admin.actor().can(AdminCapability::ViewAuditLogs).check(deps).await?;

    let pool = &deps.db_pool;
    let now = Utc::now();
    let since = now - Duration::days(RECENT_DONATION_DAYS);

    let (users, orgs, campaigns, pending_evidences, open_reports, pending_transfers) =
        futures::try_join!(
            User::count_grouped_by_role(pool),
            Organization::count_grouped_by_status(pool),
            Campaign::count_grouped_by_status(pool),
            Evidence::count_by_status(Some(EvidenceStatus::Pending), pool),
            Report::count_filtered(None, None, pool),
            BankTransferReference::count_pending(pool),
        )?;
    let (donations, recent_donations) = futures::try_join!(
        Donation::completed_totals(None, pool),
        Donation::completed_totals(Some(since), pool),
    )?;

    Ok(DashboardStats {
        total_users: users.iter().map(|(_, n)| n).sum(),
        users_by_role: status_counts(users),
        organizations_by_status: status_counts(orgs),
        campaigns_by_status: status_counts(campaigns),
        pending_evidences,
        open_reports,
        pending_bank_transfers: pending_transfers,
        donations,
        recent_donations,
        generated_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouped_rows_keep_their_order() {
        let counts = status_counts(vec![(UserRole::Donor, 12), (UserRole::Admin, 1)]);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].status, UserRole::Donor);
        assert_eq!(counts[0].count, 12);
        assert_eq!(counts[1].count, 1);
    }
}
