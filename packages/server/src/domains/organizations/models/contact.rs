use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{ContactId, OrganizationId};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrganizationContact {
    pub id: ContactId,
    pub organization_id: OrganizationId,
    pub contact_type: String,
    pub contact_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

impl OrganizationContact {
    pub async fn find_for_organization(
        organization_id: OrganizationId,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let contacts = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM organization_contacts
            WHERE organization_id = $1
            ORDER BY is_primary DESC, created_at ASC
            "#,
        )
        .bind(organization_id)
        .fetch_all(pool)
        .await?;
        Ok(contacts)
    }

    pub async fn create(
        organization_id: OrganizationId,
        contact_type: &str,
        contact_name: &str,
        email: Option<&str>,
        phone: Option<&str>,
        is_primary: bool,
        pool: &PgPool,
    ) -> Result<Self> {
        let contact = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO organization_contacts (
                organization_id, contact_type, contact_name, email, phone, is_primary
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(organization_id)
        .bind(contact_type)
        .bind(contact_name)
        .bind(email)
        .bind(phone)
        .bind(is_primary)
        .fetch_one(pool)
        .await?;
        Ok(contact)
    }

    /// Returns false when the contact does not belong to the organization.
    pub async fn delete(id: ContactId, organization_id: OrganizationId, pool: &PgPool) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM organization_contacts WHERE id = $1 AND organization_id = $2")
                .bind(id)
                .bind(organization_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() == 1)
    }
}
