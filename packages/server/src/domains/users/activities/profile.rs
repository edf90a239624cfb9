use anyhow::Result;
use serde_json::{json, Value as JsonValue};
use tracing::info;

use crate::common::validation::{max_length, phone, require_text};
use crate::common::{ApiError, AuthUser, PageParams, Paged, RequestMeta};
use crate::domains::audit::{self, AuditAction, AuditEntry};
use crate::domains::auth::models::{LoginHistory, UpdateProfile, User, UserProfile};
use crate::domains::auth::UserData;
use crate::domains::users::data::UpdateProfileInput;
use crate::kernel::ServerDeps;

pub async fn get_me(user: &AuthUser, deps: &ServerDeps) -> Result<UserData> {
    let account = User::find_by_id(user.user_id, &deps.db_pool).await?;
    let profile = UserProfile::find_by_user(user.user_id, &deps.db_pool).await?;
    Ok(UserData::new(account, profile))
}

/// Checks the input and returns the normalized update.
pub(crate) fn prepare_profile_update(input: UpdateProfileInput) -> Result<UpdateProfile, ApiError> {
    if let Some(first_name) = &input.first_name {
        require_text("first_name", first_name)?;
    }
    if let Some(last_name) = &input.last_name {
        require_text("last_name", last_name)?;
    }
    max_length("bio", input.bio.as_deref(), 1000)?;
    max_length("city", input.city.as_deref(), 100)?;

    let phone = match input.phone.as_deref() {
        Some(raw) => {
            phone::validate(raw).into_api_result("phone")?;
            phone::normalize(raw)
        }
        None => None,
    };

    Ok(UpdateProfile {
        first_name: input.first_name.map(|s| s.trim().to_string()),
        last_name: input.last_name.map(|s| s.trim().to_string()),
        phone,
        avatar_url: input.avatar_url,
        bio: input.bio,
        city: input.city,
    })
}

/// Profile fields kept in the audit trail. Phone numbers only in masked form.
fn audit_snapshot(profile: &UserProfile) -> JsonValue {
    json!({
        "first_name": profile.first_name,
        "last_name": profile.last_name,
        "phone": profile.phone.as_deref().map(phone::mask),
        "city": profile.city,
    })
}

pub async fn update_me(
    input: UpdateProfileInput,
    user: &AuthUser,
    meta: &RequestMeta,
    deps: &ServerDeps,
) -> Result<UserData> {
    let update = prepare_profile_update(input)?;
    let before = UserProfile::find_by_user(user.user_id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Profile"))?;
    let profile = UserProfile::update(user.user_id, update, &deps.db_pool).await?;

    info!(user_id = %user.user_id, "Profile updated");
    audit::record(
        AuditEntry::builder()
            .user_id(user.user_id)
            .action(AuditAction::UserProfileUpdate)
            .entity_type("user")
            .entity_id(user.user_id.into_uuid())
            .old_values(audit_snapshot(&before))
            .new_values(audit_snapshot(&profile))
            .meta(meta.clone())
            .build(),
        deps,
    )
    .await;

    let account = User::find_by_id(user.user_id, &deps.db_pool).await?;
    Ok(UserData::new(account, Some(profile)))
}

pub async fn my_login_history(
    page: PageParams,
    user: &AuthUser,
    deps: &ServerDeps,
) -> Result<Paged<LoginHistory>> {
    let items =
        LoginHistory::find_for_user(user.user_id, page.limit(), page.offset(), &deps.db_pool)
            .await?;
    let total = LoginHistory::count_for_user(user.user_id, &deps.db_pool).await?;
    Ok(Paged::new(items, page, total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_is_normalized_to_e164() {
        let update = prepare_profile_update(UpdateProfileInput {
            phone: Some("0532 123 45 67".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(update.phone.as_deref(), Some("+905321234567"));
    }

    #[test]
    fn invalid_phone_is_a_field_error() {
        let err = prepare_profile_update(UpdateProfileInput {
            phone: Some("12345".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation { field, .. } if field == "phone"));
    }

    #[test]
    fn audit_trail_never_holds_the_full_phone() {
        let profile = UserProfile {
            user_id: crate::common::UserId::new(),
            first_name: "Ayşe".to_string(),
            last_name: "Yılmaz".to_string(),
            phone: Some("+905321234567".to_string()),
            avatar_url: None,
            bio: None,
            city: Some("Van".to_string()),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        let snapshot = audit_snapshot(&profile);
        assert_eq!(snapshot["phone"], json!("+90 *** *** ** 67"));
        assert!(!snapshot.to_string().contains("5321234567"));

        let without = UserProfile { phone: None, ..profile };
        assert!(audit_snapshot(&without)["phone"].is_null());
    }

    #[test]
    fn blank_name_is_rejected_but_absent_name_is_kept() {
        assert!(prepare_profile_update(UpdateProfileInput {
            first_name: Some(" ".to_string()),
            ..Default::default()
        })
        .is_err());

        let update = prepare_profile_update(UpdateProfileInput::default()).unwrap();
        assert!(update.first_name.is_none());
    }
}
