use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::common::{EvidenceDocumentId, EvidenceId};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EvidenceDocument {
    pub id: EvidenceDocumentId,
    pub evidence_id: EvidenceId,
    pub file_name: String,
    pub file_url: String,
    pub file_size: Option<i64>,
    pub mime_type: Option<String>,
    pub is_primary: bool,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewEvidenceDocument {
    pub file_name: String,
    pub file_url: String,
    pub file_size: Option<i64>,
    pub mime_type: Option<String>,
}

impl EvidenceDocument {
    pub async fn find_for_evidence(evidence_id: EvidenceId, pool: &PgPool) -> Result<Vec<Self>> {
        let documents = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM evidence_documents
            WHERE evidence_id = $1
            ORDER BY is_primary DESC, uploaded_at ASC
            "#,
        )
        .bind(evidence_id)
        .fetch_all(pool)
        .await?;
        Ok(documents)
    }

    /// The first document attached to an evidence becomes its primary one.
    pub async fn create(
        evidence_id: EvidenceId,
        new: &NewEvidenceDocument,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let document = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO evidence_documents (evidence_id, file_name, file_url, file_size, mime_type, is_primary)
            VALUES ($1, $2, $3, $4, $5,
                NOT EXISTS (SELECT 1 FROM evidence_documents WHERE evidence_id = $1))
            RETURNING *
            "#,
        )
        .bind(evidence_id)
        .bind(&new.file_name)
        .bind(&new.file_url)
        .bind(new.file_size)
        .bind(&new.mime_type)
        .fetch_one(conn)
        .await?;
        Ok(document)
    }

    pub async fn delete(
        id: EvidenceDocumentId,
        evidence_id: EvidenceId,
        pool: &PgPool,
    ) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM evidence_documents WHERE id = $1 AND evidence_id = $2")
                .bind(id)
                .bind(evidence_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() == 1)
    }
}
