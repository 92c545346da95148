use async_trait::async_trait;
use clipcast_core::auth::Capability;
use clipcast_core::models::{AccessGrant, Invitation};
use clipcast_core::repo::InviteStore;
use clipcast_core::AppError;
use sqlx::PgPool;

use crate::db::access_grants::upsert_active_grant;

const INVITATION_COLUMNS: &str = r#"
    id, token, kind, content_id, granter_id, recipient_email,
    created_at, expires_at, is_used, used_at
"#;

/// Repository for invitation tokens
#[derive(Clone)]
pub struct InvitationRepository {
    pool: PgPool,
}

impl InvitationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, invitation: &Invitation) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO invitations (
                id, token, kind, content_id, granter_id, recipient_email,
                created_at, expires_at, is_used, used_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(invitation.id)
        .bind(&invitation.token)
        .bind(invitation.kind)
        .bind(invitation.content_id)
        .bind(invitation.granter_id)
        .bind(&invitation.recipient_email)
        .bind(invitation.created_at)
        .bind(invitation.expires_at)
        .bind(invitation.is_used)
        .bind(invitation.used_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_by_token(&self, token: &str) -> Result<Option<Invitation>, AppError> {
        let invitation = sqlx::query_as::<_, Invitation>(&format!(
            "SELECT {} FROM invitations WHERE token = $1",
            INVITATION_COLUMNS
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invitation)
    }

    /// Delete unused invitations past their expiry. Returns rows removed.
    pub async fn cleanup_expired(&self) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM invitations
            WHERE expires_at < NOW() AND is_used = FALSE
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl InviteStore for InvitationRepository {
    async fn insert(&self, invitation: &Invitation) -> Result<(), AppError> {
        self.create(invitation).await
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Invitation>, AppError> {
        self.get_by_token(token).await
    }

    async fn consume_into_grant(
        &self,
        token: &str,
        grantee_id: uuid::Uuid,
        capabilities: &[Capability],
    ) -> Result<(Invitation, AccessGrant), AppError> {
        let mut tx = self.pool.begin().await?;

        // Compare-and-set on the used flag: the WHERE clause guarantees that
        // of any number of concurrent consumers exactly one sees a row.
        let consumed = sqlx::query_as::<_, Invitation>(&format!(
            r#"
            UPDATE invitations
            SET is_used = TRUE, used_at = NOW()
            WHERE token = $1 AND is_used = FALSE AND expires_at > NOW()
            RETURNING {}
            "#,
            INVITATION_COLUMNS
        ))
        .bind(token)
        .fetch_optional(&mut *tx)
        .await?;

        let invitation = match consumed {
            Some(invitation) => invitation,
            None => {
                tx.rollback().await.ok();
                // Distinguish a lost race from a dead token, without leaking
                // which of unknown/expired applied.
                let existing = self.get_by_token(token).await?;
                return Err(match existing {
                    Some(invite) if invite.is_used => AppError::AlreadyUsed,
                    _ => AppError::InvalidOrExpired,
                });
            }
        };

        let grant = upsert_active_grant(
            &mut *tx,
            invitation.content_id,
            grantee_id,
            invitation.granter_id,
            capabilities,
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            invitation_id = %invitation.id,
            content_id = %invitation.content_id,
            grantee_id = %grantee_id,
            "Invitation consumed into grant"
        );

        Ok((invitation, grant))
    }
}
