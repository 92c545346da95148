//! Clip creation.
//!
//! Cutting a clip creates a content record referencing a parent podcast and
//! a validated offset pair. The bytes themselves come from an external
//! producer (capture or server-side cutting); the record starts in
//! `Processing` until that pipeline reports in.

use std::sync::Arc;

use uuid::Uuid;

use clipcast_core::constants::MAX_CLIP_SIZE_BYTES;
use clipcast_core::models::{
    ClipRange, Content, ContentKind, ContentStatus, NewContent, Role,
};
use clipcast_core::repo::{ContentStore, GrantStore};
use clipcast_core::AppError;
use clipcast_storage::keys;

/// Fields a caller supplies when cutting a clip.
#[derive(Debug, Clone)]
pub struct NewClip {
    pub parent_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub filename: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub start_secs: f64,
    pub end_secs: f64,
}

pub struct ClipService {
    content: Arc<dyn ContentStore>,
    grants: Arc<dyn GrantStore>,
}

impl ClipService {
    pub fn new(content: Arc<dyn ContentStore>, grants: Arc<dyn GrantStore>) -> Self {
        Self { content, grants }
    }

    /// Cut a clip from a podcast.
    ///
    /// An agency needs an active grant on the parent podcast; a studio may
    /// cut from its own podcasts. Offsets must satisfy
    /// 0 <= start < end <= parent duration.
    pub async fn create_clip(
        &self,
        actor_id: Uuid,
        actor_role: Role,
        clip: NewClip,
    ) -> Result<Content, AppError> {
        if clip.size_bytes <= 0 || clip.size_bytes as u64 > MAX_CLIP_SIZE_BYTES {
            return Err(AppError::InvalidInput(format!(
                "Clip size must be between 1 and {} bytes",
                MAX_CLIP_SIZE_BYTES
            )));
        }

        let parent = self
            .content
            .find(clip.parent_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Podcast not found: {}", clip.parent_id)))?;

        if parent.kind != ContentKind::Podcast {
            return Err(AppError::InvalidInput(
                "Clips can only be cut from podcasts".to_string(),
            ));
        }

        match actor_role {
            Role::Agency => {
                let grant = self.grants.find_active(parent.id, actor_id).await?;
                if grant.is_none() {
                    return Err(AppError::InsufficientPermission(
                        "No access to this podcast".to_string(),
                    ));
                }
            }
            Role::Studio => {
                if parent.studio_id != actor_id {
                    return Err(AppError::NotFound(format!(
                        "Podcast not found: {}",
                        clip.parent_id
                    )));
                }
            }
            Role::Editor => {
                return Err(AppError::InsufficientPermission(
                    "Editors cannot create clips".to_string(),
                ));
            }
        }

        let parent_duration = parent.duration_secs.ok_or_else(|| {
            AppError::InvalidInput("Parent podcast duration is not known yet".to_string())
        })?;
        let range = ClipRange::new(clip.start_secs, clip.end_secs, parent_duration)?;

        let file_id = Uuid::new_v4();
        let storage_key = keys::clip_key(file_id, &clip.filename);

        let content = self
            .content
            .create(NewContent {
                kind: ContentKind::Clip,
                title: clip.title,
                description: clip.description,
                studio_id: parent.studio_id,
                agency_id: (actor_role == Role::Agency).then_some(actor_id),
                filename: clip.filename,
                original_name: None,
                content_type: clip.content_type,
                size_bytes: clip.size_bytes,
                duration_secs: Some(range.duration_secs()),
                storage_key,
                parent_id: Some(parent.id),
                clip_range: Some(range),
                status: ContentStatus::Processing,
            })
            .await?;

        tracing::info!(
            clip_id = %content.id,
            parent_id = %parent.id,
            actor_id = %actor_id,
            start_secs = clip.start_secs,
            end_secs = clip.end_secs,
            "Clip created"
        );

        Ok(content)
    }
}
