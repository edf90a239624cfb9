use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;

use crate::common::{SettingId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "setting_value_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettingValueType {
    String,
    Number,
    Boolean,
    Json,
}

impl SettingValueType {
    /// Whether `value` has the JSON shape this type declares.
    pub fn accepts(&self, value: &JsonValue) -> bool {
        match self {
            SettingValueType::String => value.is_string(),
            SettingValueType::Number => value.is_number(),
            SettingValueType::Boolean => value.is_boolean(),
            SettingValueType::Json => value.is_object() || value.is_array(),
        }
    }
}

impl std::fmt::Display for SettingValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingValueType::String => write!(f, "STRING"),
            SettingValueType::Number => write!(f, "NUMBER"),
            SettingValueType::Boolean => write!(f, "BOOLEAN"),
            SettingValueType::Json => write!(f, "JSON"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SystemSetting {
    pub id: SettingId,
    pub setting_key: String,
    pub setting_value: JsonValue,
    pub value_type: SettingValueType,
    pub description: Option<String>,
    pub is_public: bool,
    pub updated_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SystemSetting {
    pub async fn find_all(pool: &PgPool) -> Result<Vec<Self>> {
        let settings =
            sqlx::query_as::<_, Self>("SELECT * FROM system_settings ORDER BY setting_key")
                .fetch_all(pool)
                .await?;
        Ok(settings)
    }

    pub async fn find_public(pool: &PgPool) -> Result<Vec<Self>> {
        let settings = sqlx::query_as::<_, Self>(
            "SELECT * FROM system_settings WHERE is_public = true ORDER BY setting_key",
        )
        .fetch_all(pool)
        .await?;
        Ok(settings)
    }

    pub async fn find_by_key(key: &str, pool: &PgPool) -> Result<Option<Self>> {
        let setting =
            sqlx::query_as::<_, Self>("SELECT * FROM system_settings WHERE setting_key = $1")
                .bind(key)
                .fetch_optional(pool)
                .await?;
        Ok(setting)
    }

    pub async fn create(
        key: &str,
        value: &JsonValue,
        value_type: SettingValueType,
        description: Option<&str>,
        is_public: bool,
        updated_by: UserId,
        pool: &PgPool,
    ) -> Result<Self> {
        let setting = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO system_settings (setting_key, setting_value, value_type, description, is_public, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(value_type)
        .bind(description)
        .bind(is_public)
        .bind(updated_by)
        .fetch_one(pool)
        .await?;
        Ok(setting)
    }

    pub async fn update(
        key: &str,
        value: &JsonValue,
        description: Option<&str>,
        is_public: Option<bool>,
        updated_by: UserId,
        pool: &PgPool,
    ) -> Result<Self> {
        let setting = sqlx::query_as::<_, Self>(
            r#"
            UPDATE system_settings SET
                setting_value = $2,
                description = COALESCE($3, description),
                is_public = COALESCE($4, is_public),
                updated_by = $5,
                updated_at = NOW()
            WHERE setting_key = $1
            RETURNING *
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(description)
        .bind(is_public)
        .bind(updated_by)
        .fetch_one(pool)
        .await?;
        Ok(setting)
    }

    pub async fn delete(key: &str, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("DELETE FROM system_settings WHERE setting_key = $1")
            .bind(key)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn value_type_checks_json_shape() {
        assert!(SettingValueType::Number.accepts(&json!(10)));
        assert!(SettingValueType::Number.accepts(&json!(12.5)));
        assert!(!SettingValueType::Number.accepts(&json!("10")));
        assert!(SettingValueType::Boolean.accepts(&json!(false)));
        assert!(SettingValueType::String.accepts(&json!("Şeffaf Bağış")));
        assert!(SettingValueType::Json.accepts(&json!({ "a": 1 })));
        assert!(!SettingValueType::Json.accepts(&json!(null)));
    }
}
