use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::common::{ApplicationDocumentId, ApplicationId, UserId};

/// Supporting paperwork attached by the applicant, verified by an admin
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ApplicationDocument {
    pub id: ApplicationDocumentId,
    pub application_id: ApplicationId,
    pub document_type: String,
    pub file_name: String,
    pub file_url: String,
    pub is_verified: bool,
    pub verified_by: Option<UserId>,
    pub verified_at: Option<DateTime<Utc>>,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewApplicationDocument {
    pub document_type: String,
    pub file_name: String,
    pub file_url: String,
}

impl ApplicationDocument {
    pub async fn find_for_application(
        application_id: ApplicationId,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let documents = sqlx::query_as::<_, Self>(
            "SELECT * FROM application_documents WHERE application_id = $1 ORDER BY uploaded_at ASC",
        )
        .bind(application_id)
        .fetch_all(pool)
        .await?;
        Ok(documents)
    }

    pub async fn count_for_application(
        application_id: ApplicationId,
        conn: &mut PgConnection,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM application_documents WHERE application_id = $1",
        )
        .bind(application_id)
        .fetch_one(conn)
        .await?;
        Ok(count)
    }

    pub async fn create(
        application_id: ApplicationId,
        new: &NewApplicationDocument,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let document = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO application_documents (application_id, document_type, file_name, file_url)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(application_id)
        .bind(&new.document_type)
        .bind(&new.file_name)
        .bind(&new.file_url)
        .fetch_one(conn)
        .await?;
        Ok(document)
    }

    pub async fn delete(
        id: ApplicationDocumentId,
        application_id: ApplicationId,
        pool: &PgPool,
    ) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM application_documents WHERE id = $1 AND application_id = $2")
                .bind(id)
                .bind(application_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn verify(
        id: ApplicationDocumentId,
        application_id: ApplicationId,
        admin_id: UserId,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let document = sqlx::query_as::<_, Self>(
            r#"
            UPDATE application_documents SET
                is_verified = true,
                verified_by = $3,
                verified_at = NOW()
            WHERE id = $1 AND application_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(application_id)
        .bind(admin_id)
        .fetch_optional(pool)
        .await?;
        Ok(document)
    }
}
