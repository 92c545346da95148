use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clipcast_core::auth::Capability;
use clipcast_core::models::{AccessGrant, GrantState};
use clipcast_core::repo::GrantStore;
use clipcast_core::AppError;
use sqlx::postgres::PgRow;
use sqlx::{PgExecutor, PgPool, Row};
use uuid::Uuid;

/// Row shape for access_grants; capabilities are stored as JSONB.
#[derive(Debug, sqlx::FromRow)]
struct GrantRow {
    id: Uuid,
    content_id: Uuid,
    grantee_id: Uuid,
    granter_id: Uuid,
    capabilities: serde_json::Value,
    state: GrantState,
    download_count: i64,
    last_download_at: Option<DateTime<Utc>>,
    granted_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<GrantRow> for AccessGrant {
    type Error = AppError;

    fn try_from(row: GrantRow) -> Result<Self, Self::Error> {
        let capabilities: Vec<Capability> = serde_json::from_value(row.capabilities)?;
        Ok(AccessGrant {
            id: row.id,
            content_id: row.content_id,
            grantee_id: row.grantee_id,
            granter_id: row.granter_id,
            capabilities,
            state: row.state,
            download_count: row.download_count,
            last_download_at: row.last_download_at,
            granted_at: row.granted_at,
            updated_at: row.updated_at,
        })
    }
}

const GRANT_COLUMNS: &str = r#"
    id, content_id, grantee_id, granter_id, capabilities, state,
    download_count, last_download_at, granted_at, updated_at
"#;

/// Upsert keyed by the (content_id, grantee_id) unique constraint.
///
/// Shared between the pool-backed repository and the invitation-consumption
/// transaction so both paths get identical semantics: reactivation refreshes
/// granter and capabilities but preserves the historical download counter.
pub(crate) async fn upsert_active_grant<'e, E>(
    executor: E,
    content_id: Uuid,
    grantee_id: Uuid,
    granter_id: Uuid,
    capabilities: &[Capability],
) -> Result<AccessGrant, AppError>
where
    E: PgExecutor<'e>,
{
    let capabilities_json = serde_json::to_value(capabilities)?;

    let row = sqlx::query_as::<_, GrantRow>(&format!(
        r#"
        INSERT INTO access_grants (content_id, grantee_id, granter_id, capabilities)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (content_id, grantee_id) DO UPDATE
        SET state = 'active',
            granter_id = EXCLUDED.granter_id,
            capabilities = EXCLUDED.capabilities,
            updated_at = NOW()
        RETURNING {}
        "#,
        GRANT_COLUMNS
    ))
    .bind(content_id)
    .bind(grantee_id)
    .bind(granter_id)
    .bind(capabilities_json)
    .fetch_one(executor)
    .await?;

    row.try_into()
}

/// Repository for access grants
#[derive(Clone)]
pub struct AccessGrantRepository {
    pool: PgPool,
}

impl AccessGrantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_active(
        &self,
        content_id: Uuid,
        grantee_id: Uuid,
    ) -> Result<Option<AccessGrant>, AppError> {
        let row = sqlx::query_as::<_, GrantRow>(&format!(
            r#"
            SELECT {}
            FROM access_grants
            WHERE content_id = $1 AND grantee_id = $2 AND state = 'active'
            "#,
            GRANT_COLUMNS
        ))
        .bind(content_id)
        .bind(grantee_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(AccessGrant::try_from).transpose()
    }

    pub async fn list_active_for_user(
        &self,
        grantee_id: Uuid,
    ) -> Result<Vec<AccessGrant>, AppError> {
        let rows = sqlx::query_as::<_, GrantRow>(&format!(
            r#"
            SELECT {}
            FROM access_grants
            WHERE grantee_id = $1 AND state = 'active'
            ORDER BY granted_at DESC
            "#,
            GRANT_COLUMNS
        ))
        .bind(grantee_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AccessGrant::try_from).collect()
    }

    /// Active grants on one content item (studio-facing share overview).
    pub async fn count_active_for_content(&self, content_id: Uuid) -> Result<i64, AppError> {
        let row: PgRow = sqlx::query(
            r#"
            SELECT COUNT(*) AS count
            FROM access_grants
            WHERE content_id = $1 AND state = 'active'
            "#,
        )
        .bind(content_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("count"))
    }
}

#[async_trait]
impl GrantStore for AccessGrantRepository {
    async fn upsert_active(
        &self,
        content_id: Uuid,
        grantee_id: Uuid,
        granter_id: Uuid,
        capabilities: &[Capability],
    ) -> Result<AccessGrant, AppError> {
        upsert_active_grant(&self.pool, content_id, grantee_id, granter_id, capabilities).await
    }

    async fn revoke(&self, content_id: Uuid, grantee_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE access_grants
            SET state = 'revoked', updated_at = NOW()
            WHERE content_id = $1 AND grantee_id = $2 AND state = 'active'
            "#,
        )
        .bind(content_id)
        .bind(grantee_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_active(
        &self,
        content_id: Uuid,
        grantee_id: Uuid,
    ) -> Result<Option<AccessGrant>, AppError> {
        self.get_active(content_id, grantee_id).await
    }

    async fn list_active_for_grantee(
        &self,
        grantee_id: Uuid,
    ) -> Result<Vec<AccessGrant>, AppError> {
        self.list_active_for_user(grantee_id).await
    }

    async fn record_download(&self, grant_id: Uuid) -> Result<i64, AppError> {
        // Atomic in-place increment; concurrent calls each count.
        let row: Option<PgRow> = sqlx::query(
            r#"
            UPDATE access_grants
            SET download_count = download_count + 1,
                last_download_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            RETURNING download_count
            "#,
        )
        .bind(grant_id)
        .fetch_optional(&self.pool)
        .await?;

        let row =
            row.ok_or_else(|| AppError::NotFound(format!("Access grant not found: {}", grant_id)))?;
        Ok(row.get("download_count"))
    }
}
