//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! Every job is a thin wrapper over a domain activity. Jobs log their counts
//! and swallow their own errors so one bad run never stops the scheduler;
//! the activities themselves skip items that fail and keep going.
//!
//! ```text
//! campaign_status            every 6h      complete / extend ACTIVE campaigns
//! bank_transfer_expiry       every 15 min  pending references -> expired
//! recurring_donations        06:00 daily   charge due recurring plans
//! evidence_reminders         09:00 daily   7/3/1 day evidence reminders
//! evidence_deadline_penalty  02:00 daily   one-time missed-deadline penalty
//! cleanup                    03:00 Sunday  token, notification, log retention
//! ```

use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::{Duration, Utc};
use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::domains::audit::AuditLog;
use crate::domains::auth::models::{LoginHistory, OneTimeToken, OneTimeTokenKind, RefreshToken};
use crate::domains::campaigns::activities::review_due_campaigns;
use crate::domains::donations::activities::{expire_overdue_transfers, process_due_recurring};
use crate::domains::evidence::activities::{apply_deadline_penalties, send_evidence_reminders};
use crate::domains::notifications::Notification;
use crate::kernel::ServerDeps;

/// Job names with their cron expressions (sec min hour day month weekday).
pub const JOBS: [(&str, &str); 6] = [
    ("campaign_status", "0 0 */6 * * *"),
    ("bank_transfer_expiry", "0 */15 * * * *"),
    ("recurring_donations", "0 0 6 * * *"),
    ("evidence_reminders", "0 0 9 * * *"),
    ("evidence_deadline_penalty", "0 0 2 * * *"),
    ("cleanup", "0 0 3 * * SUN"),
];

const REFRESH_TOKEN_GRACE_DAYS: i64 = 7;
const NOTIFICATION_RETENTION_DAYS: i64 = 90;
const LOGIN_HISTORY_RETENTION_DAYS: i64 = 90;
const AUDIT_LOG_RETENTION_DAYS: i64 = 365;

/// Start all scheduled tasks
pub async fn start_scheduler(deps: Arc<ServerDeps>) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    for (name, schedule) in JOBS {
        let job_deps = deps.clone();
        let job = Job::new_async(schedule, move |_uuid, _lock| {
            let deps = job_deps.clone();
            Box::pin(async move {
                tracing::info!(job = name, "Scheduled job started");
                match run_job(name, &deps).await {
                    Ok(result) => tracing::info!(job = name, result = %result, "Scheduled job finished"),
                    Err(e) => tracing::error!(job = name, error = %e, "Scheduled job failed"),
                }
            })
        })?;
        scheduler.add(job).await?;
    }

    scheduler.start().await?;
    tracing::info!(jobs = JOBS.len(), "Scheduled tasks started");
    Ok(scheduler)
}

/// Runs one job by name and returns its counts. Also used by `admin_cli run-job`.
pub async fn run_job(name: &str, deps: &ServerDeps) -> Result<JsonValue> {
    let result = match name {
        "campaign_status" => serde_json::to_value(review_due_campaigns(deps).await?)?,
        "bank_transfer_expiry" => json!({ "expired": expire_overdue_transfers(deps).await? }),
        "recurring_donations" => serde_json::to_value(process_due_recurring(deps).await?)?,
        "evidence_reminders" => json!({ "reminders_sent": send_evidence_reminders(deps).await? }),
        "evidence_deadline_penalty" => {
            json!({ "penalties_applied": apply_deadline_penalties(deps).await? })
        }
        "cleanup" => serde_json::to_value(run_cleanup(&deps.db_pool).await?)?,
        other => bail!(
            "Unknown job '{}'. Known jobs: {}",
            other,
            JOBS.iter().map(|(n, _)| *n).collect::<Vec<_>>().join(", ")
        ),
    };
    Ok(result)
}

#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct CleanupStats {
    pub refresh_tokens: u64,
    pub password_reset_tokens: u64,
    pub email_verification_tokens: u64,
    pub notifications: u64,
    pub login_history: u64,
    pub audit_logs: u64,
}

/// Retention sweep
async fn run_cleanup(pool: &PgPool) -> Result<CleanupStats> {
    let now = Utc::now();
    let stats = CleanupStats {
        refresh_tokens: RefreshToken::delete_stale(
            now - Duration::days(REFRESH_TOKEN_GRACE_DAYS),
            pool,
        )
        .await?,
        password_reset_tokens: OneTimeToken::delete_stale(OneTimeTokenKind::PasswordReset, now, pool)
            .await?,
        email_verification_tokens: OneTimeToken::delete_stale(
            OneTimeTokenKind::EmailVerification,
            now,
            pool,
        )
        .await?,
        notifications: Notification::delete_read_older_than(
            now - Duration::days(NOTIFICATION_RETENTION_DAYS),
            pool,
        )
        .await?,
        login_history: LoginHistory::delete_older_than(
            now - Duration::days(LOGIN_HISTORY_RETENTION_DAYS),
            pool,
        )
        .await?,
        audit_logs: AuditLog::delete_older_than(
            now - Duration::days(AUDIT_LOG_RETENTION_DAYS),
            pool,
        )
        .await?,
    };
    tracing::info!(?stats, "Cleanup complete");
    Ok(stats)
}
