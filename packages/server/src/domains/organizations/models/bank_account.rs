use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::common::{BankAccountId, OrganizationId};

/// Account donors wire bank transfers to. `iban` is stored normalized.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BankAccount {
    pub id: BankAccountId,
    pub organization_id: OrganizationId,
    pub bank_name: String,
    pub branch_name: Option<String>,
    pub account_holder: String,
    pub iban: String,
    pub currency: String,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

impl BankAccount {
    pub async fn find_for_organization(
        organization_id: OrganizationId,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let accounts = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM organization_bank_accounts
            WHERE organization_id = $1
            ORDER BY is_primary DESC, created_at ASC
            "#,
        )
        .bind(organization_id)
        .fetch_all(pool)
        .await?;
        Ok(accounts)
    }

    /// Primary account, falling back to the oldest one.
    pub async fn find_preferred(
        organization_id: OrganizationId,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let account = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM organization_bank_accounts
            WHERE organization_id = $1
            ORDER BY is_primary DESC, created_at ASC
            LIMIT 1
            "#,
        )
        .bind(organization_id)
        .fetch_optional(pool)
        .await?;
        Ok(account)
    }

    pub async fn count_for_organization(organization_id: OrganizationId, pool: &PgPool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM organization_bank_accounts WHERE organization_id = $1",
        )
        .bind(organization_id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    pub async fn find_owned(
        id: BankAccountId,
        organization_id: OrganizationId,
        conn: &mut PgConnection,
    ) -> Result<Option<Self>> {
        let account = sqlx::query_as::<_, Self>(
            "SELECT * FROM organization_bank_accounts WHERE id = $1 AND organization_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(organization_id)
        .fetch_optional(conn)
        .await?;
        Ok(account)
    }

    /// The first account of an organization becomes primary.
    pub async fn create(
        organization_id: OrganizationId,
        bank_name: &str,
        branch_name: Option<&str>,
        account_holder: &str,
        iban: &str,
        currency: &str,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let account = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO organization_bank_accounts (
                organization_id, bank_name, branch_name, account_holder, iban, currency, is_primary
            )
            VALUES ($1, $2, $3, $4, $5, $6, NOT EXISTS(
                SELECT 1 FROM organization_bank_accounts WHERE organization_id = $1
            ))
            RETURNING *
            "#,
        )
        .bind(organization_id)
        .bind(bank_name)
        .bind(branch_name)
        .bind(account_holder)
        .bind(iban)
        .bind(currency)
        .fetch_one(conn)
        .await?;
        Ok(account)
    }

    /// Clears the flag on every sibling, then sets it on `id`.
    pub async fn set_primary(
        id: BankAccountId,
        organization_id: OrganizationId,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        sqlx::query(
            "UPDATE organization_bank_accounts SET is_primary = false WHERE organization_id = $1 AND id <> $2",
        )
        .bind(organization_id)
        .bind(id)
        .execute(&mut *conn)
        .await?;

        let account = sqlx::query_as::<_, Self>(
            "UPDATE organization_bank_accounts SET is_primary = true WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_one(conn)
        .await?;
        Ok(account)
    }

    pub async fn delete(id: BankAccountId, conn: &mut PgConnection) -> Result<()> {
        sqlx::query("DELETE FROM organization_bank_accounts WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Promotes the oldest remaining account. No-op when none are left.
    pub async fn promote_oldest(organization_id: OrganizationId, conn: &mut PgConnection) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE organization_bank_accounts SET is_primary = true
            WHERE id = (
                SELECT id FROM organization_bank_accounts
                WHERE organization_id = $1
                ORDER BY created_at ASC
                LIMIT 1
            )
            "#,
        )
        .bind(organization_id)
        .execute(conn)
        .await?;
        Ok(())
    }
}
