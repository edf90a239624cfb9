//! System settings: typed reads for the rest of the server, admin CRUD

use std::collections::BTreeMap;
use std::str::FromStr;

use anyhow::Result;
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::warn;

use crate::common::{AdminCapability, ApiError, AuthUser, RequestMeta};
use crate::domains::audit::{self, AuditAction, AuditEntry};
use crate::domains::settings::models::{SettingValueType, SystemSetting};
use crate::kernel::ServerDeps;

pub const MIN_DONATION_AMOUNT: &str = "min_donation_amount";
pub const MAX_DONATION_AMOUNT: &str = "max_donation_amount";
pub const REFUND_WINDOW_DAYS: &str = "refund_window_days";
pub const MAINTENANCE_MODE: &str = "maintenance_mode";

lazy_static! {
    static ref SETTING_KEY: Regex = Regex::new(r"^[a-z][a-z0-9_.]{1,99}$").unwrap();
}

pub fn is_valid_key(key: &str) -> bool {
    SETTING_KEY.is_match(key)
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSettingInput {
    pub key: String,
    pub value: JsonValue,
    pub value_type: SettingValueType,
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSettingInput {
    pub value: JsonValue,
    pub description: Option<String>,
    pub is_public: Option<bool>,
}

// =============================================================================
// Typed accessors
// =============================================================================

async fn raw_value(key: &str, deps: &ServerDeps) -> Option<JsonValue> {
    match SystemSetting::find_by_key(key, &deps.db_pool).await {
        Ok(setting) => setting.map(|s| s.setting_value),
        Err(e) => {
            warn!(error = %e, key = %key, "Failed to read setting, using default");
            None
        }
    }
}

fn as_decimal(value: &JsonValue) -> Option<Decimal> {
    match value {
        JsonValue::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        JsonValue::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

/// Numeric setting, `default` when missing or not a number.
pub async fn get_decimal(key: &str, default: Decimal, deps: &ServerDeps) -> Decimal {
    raw_value(key, deps)
        .await
        .as_ref()
        .and_then(as_decimal)
        .unwrap_or(default)
}

pub async fn get_i64(key: &str, default: i64, deps: &ServerDeps) -> i64 {
    raw_value(key, deps)
        .await
        .and_then(|v| v.as_i64())
        .unwrap_or(default)
}

pub async fn get_bool(key: &str, default: bool, deps: &ServerDeps) -> bool {
    raw_value(key, deps)
        .await
        .and_then(|v| v.as_bool())
        .unwrap_or(default)
}

// =============================================================================
// Routes
// =============================================================================

pub async fn public_settings(deps: &ServerDeps) -> Result<BTreeMap<String, JsonValue>> {
    let settings = SystemSetting::find_public(&deps.db_pool).await?;
    Ok(settings
        .into_iter()
        .map(|s| (s.setting_key, s.setting_value))
        .collect())
}

async fn require_settings_admin(admin: &AuthUser, deps: &ServerDeps) -> Result<()> {
    admin
        .actor()
        .can(AdminCapability::ManageSettings)
        .check(deps)
        .await?;
    Ok(())
}

fn check_value(value_type: SettingValueType, value: &JsonValue) -> Result<(), ApiError> {
    if !value_type.accepts(value) {
        return Err(ApiError::validation(
            "value",
            format!("Value does not match type {}", value_type),
        ));
    }
    Ok(())
}

pub async fn list_settings(admin: &AuthUser, deps: &ServerDeps) -> Result<Vec<SystemSetting>> {
    require_settings_admin(admin, deps).await?;
    SystemSetting::find_all(&deps.db_pool).await
}

pub async fn create_setting(
    input: CreateSettingInput,
    admin: &AuthUser,
    meta: &RequestMeta,
    deps: &ServerDeps,
) -> Result<SystemSetting> {
    require_settings_admin(admin, deps).await?;
    let key = input.key.trim();
    if !is_valid_key(key) {
        return Err(ApiError::validation(
            "key",
            "Key must start with a letter and contain only a-z, 0-9, '_' or '.'",
        )
        .into());
    }
    check_value(input.value_type, &input.value)?;
    if SystemSetting::find_by_key(key, &deps.db_pool).await?.is_some() {
        return Err(ApiError::conflict("Setting already exists").into());
    }

    let setting = SystemSetting::create(
        key,
        &input.value,
        input.value_type,
        input.description.as_deref(),
        input.is_public,
        admin.user_id,
        &deps.db_pool,
    )
    .await?;

    audit::record(
        AuditEntry::builder()
            .user_id(admin.user_id)
            .action(AuditAction::SettingCreate)
            .entity_type("setting")
            .entity_id(setting.id.into_uuid())
            .new_values(json!({ "key": setting.setting_key, "value": setting.setting_value }))
            .meta(meta.clone())
            .build(),
        deps,
    )
    .await;

    Ok(setting)
}

pub async fn update_setting(
    key: &str,
    input: UpdateSettingInput,
    admin: &AuthUser,
    meta: &RequestMeta,
    deps: &ServerDeps,
) -> Result<SystemSetting> {
    require_settings_admin(admin, deps).await?;
    let current = SystemSetting::find_by_key(key, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Setting"))?;
    check_value(current.value_type, &input.value)?;

    let updated = SystemSetting::update(
        key,
        &input.value,
        input.description.as_deref(),
        input.is_public,
        admin.user_id,
        &deps.db_pool,
    )
    .await?;

    audit::record(
        AuditEntry::builder()
            .user_id(admin.user_id)
            .action(AuditAction::SettingUpdate)
            .entity_type("setting")
            .entity_id(updated.id.into_uuid())
            .old_values(json!({ "key": key, "value": current.setting_value }))
            .new_values(json!({ "key": key, "value": updated.setting_value }))
            .meta(meta.clone())
            .build(),
        deps,
    )
    .await;

    Ok(updated)
}

pub async fn delete_setting(
    key: &str,
    admin: &AuthUser,
    meta: &RequestMeta,
    deps: &ServerDeps,
) -> Result<()> {
    require_settings_admin(admin, deps).await?;
    let current = SystemSetting::find_by_key(key, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Setting"))?;
    SystemSetting::delete(key, &deps.db_pool).await?;

    audit::record(
        AuditEntry::builder()
            .user_id(admin.user_id)
            .action(AuditAction::SettingDelete)
            .entity_type("setting")
            .entity_id(current.id.into_uuid())
            .old_values(json!({ "key": key, "value": current.setting_value }))
            .meta(meta.clone())
            .build(),
        deps,
    )
    .await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_lowercase_dotted_identifiers() {
        assert!(is_valid_key("min_donation_amount"));
        assert!(is_valid_key("mail.sender"));
        assert!(!is_valid_key("Min_amount"));
        assert!(!is_valid_key("1abc"));
        assert!(!is_valid_key("a"));
        assert!(!is_valid_key("bad-key"));
    }

    #[test]
    fn decimal_reads_numbers_and_numeric_strings() {
        assert_eq!(as_decimal(&json!(10)), Some(Decimal::from(10)));
        assert_eq!(as_decimal(&json!("25.50")), Decimal::from_str("25.50").ok());
        assert_eq!(as_decimal(&json!(true)), None);
    }
}
