use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::UserId;

/// How a donor's name and amounts show up on campaign pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "donation_visibility", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DonationVisibility {
    Public,
    Anonymous,
    Private,
}

/// Notification and privacy settings. Users without a row get the column
/// defaults.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserPreference {
    pub user_id: UserId,
    pub email_notifications: bool,
    pub sms_notifications: bool,
    pub push_notifications: bool,
    pub donation_visibility: DonationVisibility,
    pub show_in_donor_list: bool,
    pub weekly_summary_email: bool,
    pub notify_on_campaign_complete: bool,
    pub notify_on_campaign_update: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferenceChanges {
    pub email_notifications: Option<bool>,
    pub sms_notifications: Option<bool>,
    pub push_notifications: Option<bool>,
    pub donation_visibility: Option<DonationVisibility>,
    pub show_in_donor_list: Option<bool>,
    pub weekly_summary_email: Option<bool>,
    pub notify_on_campaign_complete: Option<bool>,
    pub notify_on_campaign_update: Option<bool>,
}

impl UserPreference {
    /// Creates the default row on first read.
    pub async fn get_or_create(user_id: UserId, pool: &PgPool) -> Result<Self> {
        let preference = sqlx::query_as::<_, Self>(
            r#"
            WITH inserted AS (
                INSERT INTO user_preferences (user_id) VALUES ($1)
                ON CONFLICT (user_id) DO NOTHING
                RETURNING *
            )
            SELECT * FROM inserted
            UNION ALL
            SELECT * FROM user_preferences WHERE user_id = $1
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(preference)
    }

    pub async fn upsert(user_id: UserId, changes: PreferenceChanges, pool: &PgPool) -> Result<Self> {
        let preference = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO user_preferences (
                user_id, email_notifications, sms_notifications, push_notifications,
                donation_visibility, show_in_donor_list, weekly_summary_email,
                notify_on_campaign_complete, notify_on_campaign_update
            )
            VALUES (
                $1, COALESCE($2, true), COALESCE($3, false), COALESCE($4, true),
                COALESCE($5, 'ANONYMOUS'::donation_visibility), COALESCE($6, false),
                COALESCE($7, false), COALESCE($8, true), COALESCE($9, true)
            )
            ON CONFLICT (user_id) DO UPDATE SET
                email_notifications = COALESCE($2, user_preferences.email_notifications),
                sms_notifications = COALESCE($3, user_preferences.sms_notifications),
                push_notifications = COALESCE($4, user_preferences.push_notifications),
                donation_visibility = COALESCE($5, user_preferences.donation_visibility),
                show_in_donor_list = COALESCE($6, user_preferences.show_in_donor_list),
                weekly_summary_email = COALESCE($7, user_preferences.weekly_summary_email),
                notify_on_campaign_complete = COALESCE($8, user_preferences.notify_on_campaign_complete),
                notify_on_campaign_update = COALESCE($9, user_preferences.notify_on_campaign_update),
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(changes.email_notifications)
        .bind(changes.sms_notifications)
        .bind(changes.push_notifications)
        .bind(changes.donation_visibility)
        .bind(changes.show_in_donor_list)
        .bind(changes.weekly_summary_email)
        .bind(changes.notify_on_campaign_complete)
        .bind(changes.notify_on_campaign_update)
        .fetch_one(pool)
        .await?;
        Ok(preference)
    }
}
