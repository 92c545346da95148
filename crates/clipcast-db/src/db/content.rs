use async_trait::async_trait;
use clipcast_core::models::{Content, ContentStatus, NewContent};
use clipcast_core::repo::ContentStore;
use clipcast_core::AppError;
use sqlx::PgPool;
use uuid::Uuid;

const CONTENT_COLUMNS: &str = r#"
    id, kind, title, description, studio_id, agency_id, filename,
    original_name, content_type, size_bytes, duration_secs, storage_key,
    parent_id, start_secs, end_secs, status, created_at, updated_at
"#;

/// Repository for content records (podcasts and clips)
#[derive(Clone)]
pub struct ContentRepository {
    pool: PgPool,
}

impl ContentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_content(&self, content: NewContent) -> Result<Content, AppError> {
        let (start_secs, end_secs) = content
            .clip_range
            .map(|r| (Some(r.start_secs), Some(r.end_secs)))
            .unwrap_or((None, None));

        let row = sqlx::query_as::<_, Content>(&format!(
            r#"
            INSERT INTO content (
                kind, title, description, studio_id, agency_id, filename,
                original_name, content_type, size_bytes, duration_secs,
                storage_key, parent_id, start_secs, end_secs, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {}
            "#,
            CONTENT_COLUMNS
        ))
        .bind(content.kind)
        .bind(content.title)
        .bind(content.description)
        .bind(content.studio_id)
        .bind(content.agency_id)
        .bind(content.filename)
        .bind(content.original_name)
        .bind(content.content_type)
        .bind(content.size_bytes)
        .bind(content.duration_secs)
        .bind(content.storage_key)
        .bind(content.parent_id)
        .bind(start_secs)
        .bind(end_secs)
        .bind(content.status)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Content>, AppError> {
        let row = sqlx::query_as::<_, Content>(&format!(
            "SELECT {} FROM content WHERE id = $1",
            CONTENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_for_studio(&self, studio_id: Uuid) -> Result<Vec<Content>, AppError> {
        let rows = sqlx::query_as::<_, Content>(&format!(
            "SELECT {} FROM content WHERE studio_id = $1 ORDER BY created_at DESC",
            CONTENT_COLUMNS
        ))
        .bind(studio_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn list_for_agency(&self, agency_id: Uuid) -> Result<Vec<Content>, AppError> {
        let rows = sqlx::query_as::<_, Content>(&format!(
            "SELECT {} FROM content WHERE agency_id = $1 ORDER BY created_at DESC",
            CONTENT_COLUMNS
        ))
        .bind(agency_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn list_by_id_set(&self, ids: &[Uuid]) -> Result<Vec<Content>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, Content>(&format!(
            "SELECT {} FROM content WHERE id = ANY($1) ORDER BY created_at DESC",
            CONTENT_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Update title/description of a studio-owned row. Returns false when
    /// no row matched (missing or not owned).
    pub async fn update_metadata(
        &self,
        id: Uuid,
        studio_id: Uuid,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE content
            SET title = COALESCE($3, title),
                description = COALESCE($4, description),
                updated_at = NOW()
            WHERE id = $1 AND studio_id = $2
            "#,
        )
        .bind(id)
        .bind(studio_id)
        .bind(title)
        .bind(description)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn update_status(&self, id: Uuid, status: ContentStatus) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE content
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete a content row. Grants, invitations, and child clips cascade at
    /// the schema level. Returns the storage keys of the deleted row and its
    /// children so the caller can clean up the backend.
    pub async fn delete_cascading(&self, id: Uuid) -> Result<Vec<String>, AppError> {
        let keys: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT storage_key FROM content WHERE id = $1 OR parent_id = $1
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        sqlx::query("DELETE FROM content WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(keys.into_iter().map(|(k,)| k).collect())
    }
}

#[async_trait]
impl ContentStore for ContentRepository {
    async fn find(&self, id: Uuid) -> Result<Option<Content>, AppError> {
        self.get(id).await
    }

    async fn create(&self, content: NewContent) -> Result<Content, AppError> {
        self.create_content(content).await
    }

    async fn list_owned_by_studio(&self, studio_id: Uuid) -> Result<Vec<Content>, AppError> {
        self.list_for_studio(studio_id).await
    }

    async fn list_created_by_agency(&self, agency_id: Uuid) -> Result<Vec<Content>, AppError> {
        self.list_for_agency(agency_id).await
    }

    async fn list_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Content>, AppError> {
        self.list_by_id_set(ids).await
    }
}
