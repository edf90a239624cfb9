use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::common::validation::{http_url, max_length, require_text};
use crate::common::{ApiError, CampaignId, CampaignImageId, CategoryId, UserId};
use crate::domains::campaigns::models::{
    Campaign, CampaignCategory, CampaignSort, CampaignStatus, NewCampaignImage, NewCampaignUpdate,
};

pub const MAX_CAMPAIGN_IMAGES: usize = 20;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCampaignInput {
    pub title: String,
    pub description: String,
    pub short_description: Option<String>,
    pub target_amount: Decimal,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub is_urgent: bool,
    pub evidence_deadline_days: Option<i32>,
    pub beneficiary_count: Option<i32>,
    pub location_city: Option<String>,
    #[serde(default)]
    pub category_ids: Vec<CategoryId>,
    pub primary_category_id: Option<CategoryId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCampaignInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub target_amount: Option<Decimal>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub cover_image_url: Option<String>,
    pub beneficiary_count: Option<i32>,
    pub location_city: Option<String>,
    pub category_ids: Option<Vec<CategoryId>>,
    pub primary_category_id: Option<CategoryId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CampaignListQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub city: Option<String>,
    pub urgent: Option<bool>,
    pub featured: Option<bool>,
    #[serde(default)]
    pub sort: CampaignSort,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CampaignStatusQuery {
    pub status: Option<CampaignStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RejectCampaignInput {
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CampaignFlagsInput {
    pub is_featured: Option<bool>,
    pub is_urgent: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategoryInput {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub display_order: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCategoryInput {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

/// Campaign page with its organization and categories
#[derive(Debug, Clone, Serialize)]
pub struct CampaignDetail {
    #[serde(flatten)]
    pub campaign: Campaign,
    pub organization_name: String,
    pub organization_logo_url: Option<String>,
    pub categories: Vec<CampaignCategory>,
    pub progress_percent: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_following: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignStats {
    pub collected_amount: Decimal,
    pub target_amount: Decimal,
    pub progress_percent: Decimal,
    pub donor_count: i32,
    pub follower_count: i64,
    pub days_remaining: Option<i64>,
    pub approved_evidence_total: Decimal,
}

/// `collected / target * 100`, two decimals, capped at 100 for display.
pub fn progress_percent(collected: Decimal, target: Decimal) -> Decimal {
    if target <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let percent = (collected / target * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    percent.min(Decimal::ONE_HUNDRED)
}

const SECONDS_PER_DAY: i64 = 86_400;

/// Whole days until `end_date`, zero once it has passed.
pub fn days_remaining(end_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<i64> {
    end_date.map(|end| {
        let seconds = (end - now).num_seconds();
        if seconds <= 0 {
            0
        } else {
            // Partial days count as a full day left.
            (seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY
        }
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCampaignUpdateInput {
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
}

impl CreateCampaignUpdateInput {
    pub fn into_new(self, campaign_id: CampaignId, author_id: UserId) -> Result<NewCampaignUpdate, ApiError> {
        require_text("title", &self.title)?;
        max_length("title", Some(&self.title), 200)?;
        require_text("content", &self.content)?;
        max_length("content", Some(&self.content), 10_000)?;
        let image_url = match self.image_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Some(http_url("image_url", url)?),
            _ => None,
        };
        Ok(NewCampaignUpdate {
            campaign_id,
            author_id,
            title: self.title.trim().to_string(),
            content: self.content.trim().to_string(),
            image_url,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddCampaignImageInput {
    pub image_url: String,
    pub thumbnail_url: Option<String>,
    pub caption: Option<String>,
    pub display_order: Option<i32>,
}

impl AddCampaignImageInput {
    pub fn validate(self) -> Result<NewCampaignImage, ApiError> {
        let thumbnail_url = match self.thumbnail_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Some(http_url("thumbnail_url", url)?),
            _ => None,
        };
        let caption = self
            .caption
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        max_length("caption", caption.as_deref(), 255)?;
        if matches!(self.display_order, Some(n) if n < 0) {
            return Err(ApiError::validation("display_order", "display_order cannot be negative"));
        }
        Ok(NewCampaignImage {
            image_url: http_url("image_url", &self.image_url)?,
            thumbnail_url,
            caption,
            display_order: self.display_order,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReorderImagesInput {
    pub image_ids: Vec<CampaignImageId>,
}

/// The new order must name every current image exactly once.
pub fn check_reorder(current: &[CampaignImageId], requested: &[CampaignImageId]) -> Result<(), ApiError> {
    let mut wanted = requested.to_vec();
    wanted.sort();
    wanted.dedup();
    let mut have = current.to_vec();
    have.sort();
    if wanted.len() != requested.len() || wanted != have {
        return Err(ApiError::validation(
            "image_ids",
            "image_ids must list every image of the campaign exactly once",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn progress_rounds_to_two_decimals() {
        assert_eq!(progress_percent(dec("1"), dec("3")), dec("33.33"));
        assert_eq!(progress_percent(dec("2"), dec("3")), dec("66.67"));
        assert_eq!(progress_percent(dec("0"), dec("1000")), dec("0"));
    }

    #[test]
    fn progress_is_capped_for_overfunded_campaigns() {
        assert_eq!(progress_percent(dec("1500"), dec("1000")), dec("100"));
    }

    #[test]
    fn days_remaining_counts_partial_days() {
        let now = Utc::now();
        assert_eq!(days_remaining(Some(now + Duration::hours(36)), now), Some(2));
        assert_eq!(days_remaining(Some(now + Duration::days(7)), now), Some(7));
        assert_eq!(days_remaining(Some(now - Duration::days(1)), now), Some(0));
        assert_eq!(days_remaining(None, now), None);
    }

    #[test]
    fn list_query_defaults_to_newest() {
        let query: CampaignListQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.sort, CampaignSort::Newest);
    }

    #[test]
    fn reorder_must_cover_every_image_once() {
        let (a, b, c) = (CampaignImageId::new(), CampaignImageId::new(), CampaignImageId::new());
        let current = [a, b, c];
        assert!(check_reorder(&current, &[c, a, b]).is_ok());
        assert!(check_reorder(&current, &[c, a]).is_err());
        assert!(check_reorder(&current, &[c, a, a]).is_err());
        assert!(check_reorder(&current, &[c, a, b, CampaignImageId::new()]).is_err());
    }

    #[test]
    fn update_posts_need_text_and_http_images() {
        let input = CreateCampaignUpdateInput {
            title: " İlk teslimat ".to_string(),
            content: "Kırtasiye paketleri okullara ulaştı".to_string(),
            image_url: Some(" ".to_string()),
        };
        let new = input.into_new(CampaignId::new(), UserId::new()).unwrap();
        assert_eq!(new.title, "İlk teslimat");
        assert!(new.image_url.is_none());

        let bad = CreateCampaignUpdateInput {
            title: "x".to_string(),
            content: "y".to_string(),
            image_url: Some("data:image/png;base64,AAAA".to_string()),
        };
        assert!(bad.into_new(CampaignId::new(), UserId::new()).is_err());
    }

    #[test]
    fn images_cannot_take_negative_positions() {
        let input = AddCampaignImageInput {
            image_url: "https://cdn.example.org/1.jpg".to_string(),
            thumbnail_url: None,
            caption: Some("  ".to_string()),
            display_order: Some(-1),
        };
        assert!(input.validate().is_err());
    }
}
