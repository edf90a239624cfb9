//! Test fixtures for creating test data.
//!
//! These fixtures use the model methods directly to create test data.

use anyhow::Result;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde_json::{json, Value as JsonValue};
use server_core::common::UserRole;
use server_core::domains::auth::models::{User, UserProfile, UserStatus};
use server_core::domains::auth::password::hash_password;
use server_core::domains::campaigns::models::{Campaign, CampaignStatus, NewCampaign};
use server_core::domains::organizations::models::{
    BankAccount, NewOrganization, Organization, OrganizationType,
};
use server_core::domains::transparency::activities::initialize_score_in;
use sqlx::PgPool;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "Guclu!Sifre42";

/// Active, verified user with a profile and a unique e-mail
pub async fn create_user(pool: &PgPool, role: UserRole) -> Result<User> {
    let email = format!("{}-{}@test.seffafbagis.org", role.to_string().to_lowercase(), Uuid::new_v4().simple());
    let hash = hash_password(TEST_PASSWORD)?;
    let mut tx = pool.begin().await?;
    let user = User::create(&email, &hash, role, UserStatus::Active, &mut tx).await?;
    let user = User::mark_email_verified(user.id, &mut tx).await?;
    UserProfile::create(user.id, "Test", "Kullanıcı", &mut tx).await?;
    tx.commit().await?;
    Ok(user)
}

/// Foundation user with an APPROVED organization
pub async fn create_approved_organization(
    pool: &PgPool,
    admin: &User,
) -> Result<(User, Organization)> {
    let owner = create_user(pool, UserRole::Foundation).await?;
    let tax_number = format!("{:010}", Uuid::new_v4().as_u128() % 10_000_000_000);
    let org = Organization::create(
        NewOrganization {
            user_id: owner.id,
            organization_type: OrganizationType::Foundation,
            legal_name: "Test Eğitim Vakfı".to_string(),
            trade_name: None,
            tax_number,
            derbis_number: None,
            mersis_number: None,
            establishment_date: None,
            description: Some("Köy okullarına destek".to_string()),
            mission_statement: None,
            logo_url: None,
            website_url: None,
        },
        pool,
    )
    .await?;
    let mut conn = pool.acquire().await?;
    let org = Organization::approve(org.id, admin.id, &mut conn)
        .await?
        .ok_or_else(|| anyhow::anyhow!("organization was not pending"))?;
    initialize_score_in(org.id, &mut conn).await?;
    Ok((owner, org))
}

/// ACTIVE campaign ending in `end_in_days`
pub async fn create_active_campaign(
    pool: &PgPool,
    org: &Organization,
    owner: &User,
    admin: &User,
    target: Decimal,
    end_in_days: i64,
) -> Result<Campaign> {
    let now = Utc::now();
    let mut conn = pool.acquire().await?;
    let campaign = Campaign::create(
        NewCampaign {
            organization_id: org.id,
            title: "Kışlık Mont Kampanyası".to_string(),
            slug: format!("kislik-mont-{}", Uuid::new_v4().simple()),
            description: "Köy okullarındaki öğrencilere mont".to_string(),
            short_description: None,
            target_amount: target,
            start_date: Some(now - Duration::days(1)),
            end_date: Some(now + Duration::days(end_in_days)),
            cover_image_url: None,
            is_urgent: false,
            evidence_deadline_days: 15,
            created_by: owner.id,
            beneficiary_count: Some(40),
            location_city: Some("Van".to_string()),
        },
        &mut conn,
    )
    .await?;
    Campaign::transition(
        campaign.id,
        CampaignStatus::Draft,
        CampaignStatus::PendingApproval,
        &mut conn,
    )
    .await?;
    drop(conn);
    let campaign = Campaign::approve(campaign.id, admin.id, pool)
        .await?
        .ok_or_else(|| anyhow::anyhow!("campaign was not pending approval"))?;
    Ok(campaign)
}

/// Primary TRY account so bank transfers have somewhere to point
pub async fn add_bank_account(pool: &PgPool, org: &Organization) -> Result<BankAccount> {
    let mut conn = pool.acquire().await?;
    BankAccount::create(
        org.id,
        "Ziraat Bankası",
        Some("Van Şubesi"),
        &org.legal_name,
        "TR330006100519786457841326",
        "TRY",
        &mut conn,
    )
    .await
}

/// Flips a platform setting the way an admin would
pub async fn set_setting(pool: &PgPool, key: &str, value: JsonValue) -> Result<()> {
    sqlx::query("UPDATE system_settings SET setting_value = $2 WHERE setting_key = $1")
        .bind(key)
        .bind(value)
        .execute(pool)
        .await?;
    Ok(())
}

/// Card payload the mock gateway accepts
pub fn test_card() -> JsonValue {
    json!({
        "holder_name": "AYSE YILMAZ",
        "number": "4111 1111 1111 1111",
        "expiry_month": 12,
        "expiry_year": 2030,
        "cvc": "123"
    })
}
