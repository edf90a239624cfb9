use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use typed_builder::TypedBuilder;
use uuid::Uuid;

use crate::common::{AuditLogId, RequestMeta, UserId};

/// What an audit row records. Stored as TEXT so new actions need no migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    UserRegister,
    UserLogin,
    LoginFailed,
    PasswordChange,
    PasswordResetComplete,
    UserProfileUpdate,
    UserStatusChange,
    UserRoleChange,
    UserUnlock,
    OrganizationVerify,
    OrganizationReject,
    OrganizationFeature,
    CampaignApprove,
    CampaignReject,
    CampaignFlagsUpdate,
    CategoryCreate,
    CategoryUpdate,
    CategoryDeactivate,
    EvidenceApprove,
    EvidenceReject,
    BankTransferMatch,
    RefundApprove,
    RefundReject,
    SettingCreate,
    SettingUpdate,
    SettingDelete,
    ReportAssign,
    ReportResolve,
    TransparencyRecalculate,
    ApplicationReview,
    ApplicationAssign,
    ApplicationDocumentVerify,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::UserRegister => "USER_REGISTER",
            AuditAction::UserLogin => "USER_LOGIN",
            AuditAction::LoginFailed => "LOGIN_FAILED",
            AuditAction::PasswordChange => "PASSWORD_CHANGE",
            AuditAction::PasswordResetComplete => "PASSWORD_RESET_COMPLETE",
            AuditAction::UserProfileUpdate => "USER_PROFILE_UPDATE",
            AuditAction::UserStatusChange => "USER_STATUS_CHANGE",
            AuditAction::UserRoleChange => "USER_ROLE_CHANGE",
            AuditAction::UserUnlock => "USER_UNLOCK",
            AuditAction::OrganizationVerify => "ORGANIZATION_VERIFY",
            AuditAction::OrganizationReject => "ORGANIZATION_REJECT",
            AuditAction::OrganizationFeature => "ORGANIZATION_FEATURE",
            AuditAction::CampaignApprove => "CAMPAIGN_APPROVE",
            AuditAction::CampaignReject => "CAMPAIGN_REJECT",
            AuditAction::CampaignFlagsUpdate => "CAMPAIGN_FLAGS_UPDATE",
            AuditAction::CategoryCreate => "CATEGORY_CREATE",
            AuditAction::CategoryUpdate => "CATEGORY_UPDATE",
            AuditAction::CategoryDeactivate => "CATEGORY_DEACTIVATE",
            AuditAction::EvidenceApprove => "EVIDENCE_APPROVE",
            AuditAction::EvidenceReject => "EVIDENCE_REJECT",
            AuditAction::BankTransferMatch => "BANK_TRANSFER_MATCH",
            AuditAction::RefundApprove => "REFUND_APPROVE",
            AuditAction::RefundReject => "REFUND_REJECT",
            AuditAction::SettingCreate => "SETTING_CREATE",
            AuditAction::SettingUpdate => "SETTING_UPDATE",
            AuditAction::SettingDelete => "SETTING_DELETE",
            AuditAction::ReportAssign => "REPORT_ASSIGN",
            AuditAction::ReportResolve => "REPORT_RESOLVE",
            AuditAction::TransparencyRecalculate => "TRANSPARENCY_RECALCULATE",
            AuditAction::ApplicationReview => "APPLICATION_REVIEW",
            AuditAction::ApplicationAssign => "APPLICATION_ASSIGN",
            AuditAction::ApplicationDocumentVerify => "APPLICATION_DOCUMENT_VERIFY",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row to append to the audit trail.
///
/// ```rust,ignore
/// AuditEntry::builder()
///     .user_id(admin.user_id)
///     .action(AuditAction::CampaignApprove)
///     .entity_type("campaign")
///     .entity_id(campaign.id.into_uuid())
///     .new_values(json!({ "status": "ACTIVE" }))
///     .meta(meta.clone())
///     .build()
/// ```
#[derive(Clone, Debug, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct AuditEntry {
    #[builder(default)]
    pub user_id: Option<UserId>,
    pub action: AuditAction,
    pub entity_type: String,
    #[builder(default)]
    pub entity_id: Option<Uuid>,
    #[builder(default)]
    pub old_values: Option<JsonValue>,
    #[builder(default)]
    pub new_values: Option<JsonValue>,
    #[builder(default)]
    pub meta: RequestMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditLog {
    pub id: AuditLogId,
    pub user_id: Option<UserId>,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<Uuid>,
    pub old_values: Option<JsonValue>,
    pub new_values: Option<JsonValue>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Admin search over the trail; every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditLogFilter {
    pub user_id: Option<UserId>,
    pub action: Option<String>,
    pub entity_type: Option<String>,
    pub entity_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

const FILTER_WHERE: &str = r#"
    WHERE ($1::uuid IS NULL OR user_id = $1)
      AND ($2::text IS NULL OR action = $2)
      AND ($3::text IS NULL OR entity_type = $3)
      AND ($4::uuid IS NULL OR entity_id = $4)
      AND ($5::timestamptz IS NULL OR created_at >= $5)
      AND ($6::timestamptz IS NULL OR created_at <= $6)
"#;

impl AuditLog {
    pub async fn insert(entry: &AuditEntry, pool: &PgPool) -> Result<Self> {
        let log = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO audit_logs (
                id, user_id, action, entity_type, entity_id,
                old_values, new_values, ip_address, user_agent
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(AuditLogId::new())
        .bind(entry.user_id)
        .bind(entry.action.as_str())
        .bind(&entry.entity_type)
        .bind(entry.entity_id)
        .bind(&entry.old_values)
        .bind(&entry.new_values)
        .bind(&entry.meta.ip_address)
        .bind(&entry.meta.user_agent)
        .fetch_one(pool)
        .await?;
        Ok(log)
    }

    pub async fn find_by_id(id: AuditLogId, pool: &PgPool) -> Result<Option<Self>> {
        let log = sqlx::query_as::<_, Self>("SELECT * FROM audit_logs WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(log)
    }

    /// Newest first.
    pub async fn find_filtered(
        filter: &AuditLogFilter,
        limit: i64,
        offset: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let sql = format!(
            "SELECT * FROM audit_logs {} ORDER BY created_at DESC LIMIT $7 OFFSET $8",
            FILTER_WHERE
        );
        let logs = sqlx::query_as::<_, Self>(&sql)
            .bind(filter.user_id)
            .bind(&filter.action)
            .bind(&filter.entity_type)
            .bind(filter.entity_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;
        Ok(logs)
    }

    pub async fn count_filtered(filter: &AuditLogFilter, pool: &PgPool) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM audit_logs {}", FILTER_WHERE);
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(filter.user_id)
            .bind(&filter.action)
            .bind(&filter.entity_type)
            .bind(filter.entity_id)
            .bind(filter.from)
            .bind(filter.to)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    pub async fn delete_older_than(cutoff: DateTime<Utc>, pool: &PgPool) -> Result<u64> {
        let result = sqlx::query("DELETE FROM audit_logs WHERE created_at < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_fills_optional_fields_with_defaults() {
        let entry = AuditEntry::builder()
            .action(AuditAction::SettingUpdate)
            .entity_type("system_setting")
            .build();

        assert!(entry.user_id.is_none());
        assert!(entry.entity_id.is_none());
        assert!(entry.meta.ip_address.is_none());
    }

    #[test]
    fn builder_accepts_plain_values_for_optional_fields() {
        let user_id = UserId::new();
        let entity = Uuid::new_v4();
        let entry = AuditEntry::builder()
            .user_id(user_id)
            .action(AuditAction::CampaignApprove)
            .entity_type("campaign")
            .entity_id(entity)
            .new_values(json!({ "status": "ACTIVE" }))
            .build();

        assert_eq!(entry.user_id, Some(user_id));
        assert_eq!(entry.entity_id, Some(entity));
        assert_eq!(entry.new_values.unwrap()["status"], "ACTIVE");
    }

    #[test]
    fn action_text_matches_serde_name() {
        for action in [
            AuditAction::UserRegister,
            AuditAction::PasswordResetComplete,
            AuditAction::TransparencyRecalculate,
            AuditAction::BankTransferMatch,
            AuditAction::ApplicationDocumentVerify,
        ] {
            let json = serde_json::to_value(action).unwrap();
            assert_eq!(json, action.as_str());
        }
    }
}
