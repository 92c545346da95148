//! Role-scoped access control.
//!
//! Answers "can user U perform action A on content C" and enumerates the
//! content visible to a user, consistently with role semantics: studios see
//! what they own, agencies see what they were granted plus what they cut,
//! editors see only what they were granted.

use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use clipcast_core::auth::{Capability, Identity, PermissionMatrix, TokenCodec};
use clipcast_core::models::{AccessGrant, Content, ContentKind, Role};
use clipcast_core::repo::{ContentStore, GrantStore, UserStore};
use clipcast_core::AppError;

/// Capability subset delegated with a grant, by content kind: a podcast
/// grant lets an agency cut clips, a clip grant lets an editor download.
pub fn default_grant_capabilities(kind: ContentKind) -> &'static [Capability] {
    match kind {
        ContentKind::Podcast => &[Capability::CreateClips, Capability::ViewAssignedContent],
        ContentKind::Clip => &[Capability::DownloadClips, Capability::ViewAssignedClips],
    }
}

/// Result of a tracked download: editors download through a grant and bump
/// its counter; owners download their own content with no counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadTracking {
    Counted { download_count: i64 },
    OwnerDownload,
}

pub struct AccessControlService {
    codec: TokenCodec,
    users: Arc<dyn UserStore>,
    content: Arc<dyn ContentStore>,
    grants: Arc<dyn GrantStore>,
}

impl AccessControlService {
    pub fn new(
        codec: TokenCodec,
        users: Arc<dyn UserStore>,
        content: Arc<dyn ContentStore>,
        grants: Arc<dyn GrantStore>,
    ) -> Self {
        Self {
            codec,
            users,
            content,
            grants,
        }
    }

    /// Decode and validate a bearer credential, then check the role's static
    /// capability set. Pure and synchronous; no I/O.
    ///
    /// Fails with `InvalidCredential` on a malformed or expired token and
    /// `InsufficientPermission` when the role lacks the capability; both
    /// surface to the caller verbatim, never downgraded.
    pub fn authorize(&self, bearer: &str, capability: Capability) -> Result<Identity, AppError> {
        let identity = self.codec.decode(bearer)?;

        if !PermissionMatrix::allows(identity.role, capability) {
            return Err(AppError::InsufficientPermission(format!(
                "Role {} lacks capability {:?}",
                identity.role, capability
            )));
        }

        Ok(identity)
    }

    /// Whether `granter_id` owns or holds delegable rights to `content`:
    /// a studio owns its podcasts (and their clips) outright; an agency may
    /// re-grant only clips it created, never the parent podcast.
    fn is_delegable_by(content: &Content, granter_id: Uuid) -> bool {
        match content.kind {
            ContentKind::Podcast => content.studio_id == granter_id,
            ContentKind::Clip => {
                content.studio_id == granter_id || content.agency_id == Some(granter_id)
            }
        }
    }

    /// Load content and verify the granter may delegate it. Missing and
    /// non-delegable content are indistinguishable to the caller.
    pub async fn delegable_content(
        &self,
        granter_id: Uuid,
        content_id: Uuid,
    ) -> Result<Content, AppError> {
        let content = self
            .content
            .find(content_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Content not found: {}", content_id)))?;

        if !Self::is_delegable_by(&content, granter_id) {
            return Err(AppError::NotFound(format!(
                "Content not found: {}",
                content_id
            )));
        }

        Ok(content)
    }

    /// Create or reactivate the grant for (content, grantee).
    ///
    /// Idempotent: a second call for the same pair reactivates the single
    /// existing row; the historical download counter is preserved. No
    /// counters move here; counting belongs to [`Self::track_download`].
    pub async fn grant_access(
        &self,
        granter_id: Uuid,
        content_id: Uuid,
        grantee_id: Uuid,
    ) -> Result<AccessGrant, AppError> {
        let content = self.delegable_content(granter_id, content_id).await?;

        let grantee = self
            .users
            .find_by_id(grantee_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found: {}", grantee_id)))?;
        if !grantee.is_active {
            return Err(AppError::NotFound(format!("User not found: {}", grantee_id)));
        }

        let grant = self
            .grants
            .upsert_active(
                content_id,
                grantee_id,
                granter_id,
                default_grant_capabilities(content.kind),
            )
            .await?;

        tracing::info!(
            content_id = %content_id,
            grantee_id = %grantee_id,
            granter_id = %granter_id,
            "Access granted"
        );

        Ok(grant)
    }

    /// Logical delete: Active -> Revoked. The row (and its counter) remains
    /// for audit; re-granting later reactivates it.
    pub async fn revoke_access(
        &self,
        granter_id: Uuid,
        content_id: Uuid,
        grantee_id: Uuid,
    ) -> Result<(), AppError> {
        self.delegable_content(granter_id, content_id).await?;

        let revoked = self.grants.revoke(content_id, grantee_id).await?;
        if !revoked {
            return Err(AppError::NotFound(format!(
                "No active grant for user {} on content {}",
                grantee_id, content_id
            )));
        }

        tracing::info!(
            content_id = %content_id,
            grantee_id = %grantee_id,
            "Access revoked"
        );

        Ok(())
    }

    /// Enumerate the content visible to a user. The three role branches stay
    /// behaviorally distinct: the studio branch never consults grants, the
    /// editor branch never consults ownership.
    pub async fn list_visible_content(
        &self,
        user_id: Uuid,
        role: Role,
    ) -> Result<Vec<Content>, AppError> {
        match role {
            Role::Studio => self.content.list_owned_by_studio(user_id).await,
            Role::Agency => {
                let grants = self.grants.list_active_for_grantee(user_id).await?;
                let granted_ids: Vec<Uuid> = grants.iter().map(|g| g.content_id).collect();
                let mut visible = self.content.list_by_ids(&granted_ids).await?;

                let mut seen: HashSet<Uuid> = visible.iter().map(|c| c.id).collect();
                for clip in self.content.list_created_by_agency(user_id).await? {
                    if seen.insert(clip.id) {
                        visible.push(clip);
                    }
                }

                visible.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                Ok(visible)
            }
            Role::Editor => {
                let grants = self.grants.list_active_for_grantee(user_id).await?;
                let granted_ids: Vec<Uuid> = grants.iter().map(|g| g.content_id).collect();
                self.content.list_by_ids(&granted_ids).await
            }
        }
    }

    /// Find the caller's active grant on a content item, if any.
    pub async fn active_grant(
        &self,
        content_id: Uuid,
        grantee_id: Uuid,
    ) -> Result<Option<AccessGrant>, AppError> {
        self.grants.find_active(content_id, grantee_id).await
    }

    /// Record one successful download.
    ///
    /// Editors must hold an active grant; the grant's counter is bumped with
    /// an atomic increment so concurrent downloads each count. Agencies and
    /// studios download content they own without touching any counter.
    /// Call only after the transfer succeeded, never on a failed or partial
    /// one.
    pub async fn track_download(
        &self,
        user_id: Uuid,
        role: Role,
        content_id: Uuid,
    ) -> Result<DownloadTracking, AppError> {
        match role {
            Role::Editor => {
                let grant = self
                    .grants
                    .find_active(content_id, user_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::InsufficientPermission(
                            "No active grant for this content".to_string(),
                        )
                    })?;

                let download_count = self.grants.record_download(grant.id).await?;
                Ok(DownloadTracking::Counted { download_count })
            }
            Role::Agency | Role::Studio => {
                let content = self.content.find(content_id).await?.ok_or_else(|| {
                    AppError::NotFound(format!("Content not found: {}", content_id))
                })?;

                if !content.is_owned_by(user_id) {
                    return Err(AppError::InsufficientPermission(
                        "Not the owner of this content".to_string(),
                    ));
                }

                Ok(DownloadTracking::OwnerDownload)
            }
        }
    }
}
