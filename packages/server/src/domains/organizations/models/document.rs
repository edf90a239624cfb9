use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{DocumentId, OrganizationId};

/// Verification document. Only the URL is stored; bytes live elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrganizationDocument {
    pub id: DocumentId,
    pub organization_id: OrganizationId,
    pub document_type: String,
    pub document_name: String,
    pub file_url: String,
    pub is_verified: bool,
    pub uploaded_at: DateTime<Utc>,
}

impl OrganizationDocument {
    pub async fn find_for_organization(
        organization_id: OrganizationId,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let docs = sqlx::query_as::<_, Self>(
            "SELECT * FROM organization_documents WHERE organization_id = $1 ORDER BY uploaded_at ASC",
        )
        .bind(organization_id)
        .fetch_all(pool)
        .await?;
        Ok(docs)
    }

    pub async fn count_for_organization(organization_id: OrganizationId, pool: &PgPool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM organization_documents WHERE organization_id = $1",
        )
        .bind(organization_id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    pub async fn create(
        organization_id: OrganizationId,
        document_type: &str,
        document_name: &str,
        file_url: &str,
        pool: &PgPool,
    ) -> Result<Self> {
        let doc = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO organization_documents (organization_id, document_type, document_name, file_url)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(organization_id)
        .bind(document_type)
        .bind(document_name)
        .bind(file_url)
        .fetch_one(pool)
        .await?;
        Ok(doc)
    }

    pub async fn delete(id: DocumentId, organization_id: OrganizationId, pool: &PgPool) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM organization_documents WHERE id = $1 AND organization_id = $2")
                .bind(id)
                .bind(organization_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Marks every document verified once the organization is approved.
    pub async fn mark_all_verified(
        organization_id: OrganizationId,
        conn: &mut sqlx::PgConnection,
    ) -> Result<()> {
        sqlx::query("UPDATE organization_documents SET is_verified = true WHERE organization_id = $1")
            .bind(organization_id)
            .execute(conn)
            .await?;
        Ok(())
    }
}
