//! Podcast routes: role-scoped listing, detail, playback, and deletion.

use crate::auth::BearerToken;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use clipcast_core::auth::Capability;
use clipcast_core::models::{Content, ContentKind, Role};
use clipcast_core::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, ToSchema)]
pub struct PodcastSummary {
    #[serde(flatten)]
    pub content: Content,
    /// Active grants on this podcast; studio listings only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_count: Option<i64>,
}

/// List podcasts visible to the caller
#[utoipa::path(
    get,
    path = "/api/podcasts",
    tag = "podcasts",
    responses(
        (status = 200, description = "Visible podcasts", body = [PodcastSummary]),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn list_podcasts(
    BearerToken(token): BearerToken,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let identity = state.codec.decode(&token)?;

    let visible = state
        .access
        .list_visible_content(identity.user_id, identity.role)
        .await?;

    let mut podcasts = Vec::new();
    for content in visible
        .into_iter()
        .filter(|c| c.kind == ContentKind::Podcast)
    {
        let access_count = if identity.role == Role::Studio {
            Some(state.grants.count_active_for_content(content.id).await?)
        } else {
            None
        };
        podcasts.push(PodcastSummary {
            content,
            access_count,
        });
    }

    Ok(Json(podcasts))
}

/// Load a podcast the caller may see: owning studio, or an agency holding an
/// active grant. Missing and invisible are indistinguishable.
async fn visible_podcast(
    state: &AppState,
    user_id: Uuid,
    role: Role,
    podcast_id: Uuid,
) -> Result<Content, AppError> {
    let not_found = || AppError::NotFound(format!("Podcast not found: {}", podcast_id));

    let content = state.content.get(podcast_id).await?.ok_or_else(not_found)?;
    if content.kind != ContentKind::Podcast {
        return Err(not_found());
    }

    let allowed = match role {
        Role::Studio => content.studio_id == user_id,
        Role::Agency => state
            .grants
            .get_active(podcast_id, user_id)
            .await?
            .is_some(),
        Role::Editor => false,
    };

    if !allowed {
        return Err(not_found());
    }
    Ok(content)
}

/// Get one podcast
#[utoipa::path(
    get,
    path = "/api/podcasts/{id}",
    tag = "podcasts",
    params(("id" = Uuid, Path, description = "Podcast ID")),
    responses(
        (status = 200, description = "Podcast", body = Content),
        (status = 404, description = "Not found or not visible", body = ErrorResponse)
    )
)]
pub async fn get_podcast(
    BearerToken(token): BearerToken,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let identity = state.codec.decode(&token)?;
    let content = visible_podcast(&state, identity.user_id, identity.role, id).await?;
    Ok(Json(content))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlaybackResponse {
    pub content_id: Uuid,
    pub url: String,
}

/// Mint a time-bounded playback URL for a podcast the caller may see
#[utoipa::path(
    post,
    path = "/api/podcasts/{id}/playback",
    tag = "podcasts",
    params(("id" = Uuid, Path, description = "Podcast ID")),
    responses(
        (status = 200, description = "Playback URL", body = PlaybackResponse),
        (status = 404, description = "Not found or not visible", body = ErrorResponse)
    )
)]
pub async fn playback_podcast(
    BearerToken(token): BearerToken,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let identity = state.codec.decode(&token)?;
    let content = visible_podcast(&state, identity.user_id, identity.role, id).await?;

    let url = state
        .gateway
        .authorize_read(
            &content.storage_key,
            Duration::from_secs(state.config.read_url_ttl_secs),
        )
        .await?;

    Ok(Json(PlaybackResponse {
        content_id: content.id,
        url,
    }))
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdatePodcastRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Update a podcast's title or description
#[utoipa::path(
    put,
    path = "/api/podcasts/{id}",
    tag = "podcasts",
    params(("id" = Uuid, Path, description = "Podcast ID")),
    request_body = UpdatePodcastRequest,
    responses(
        (status = 200, description = "Podcast updated"),
        (status = 403, description = "Insufficient permission", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn update_podcast(
    BearerToken(token): BearerToken,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePodcastRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let identity = state.access.authorize(&token, Capability::ManageContent)?;
    request.validate().map_err(AppError::from)?;

    let updated = state
        .content
        .update_metadata(
            id,
            identity.user_id,
            request.title.as_deref(),
            request.description.as_deref(),
        )
        .await?;

    if !updated {
        return Err(HttpAppError::from(AppError::NotFound(format!(
            "Podcast not found: {}",
            id
        ))));
    }

    Ok(Json(serde_json::json!({ "updated": true })))
}

/// Delete a podcast
///
/// Cascades to grants, invitations, and child clips; stored objects are
/// cleaned up best-effort afterwards.
#[utoipa::path(
    delete,
    path = "/api/podcasts/{id}",
    tag = "podcasts",
    params(("id" = Uuid, Path, description = "Podcast ID")),
    responses(
        (status = 200, description = "Podcast deleted"),
        (status = 403, description = "Insufficient permission", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn delete_podcast(
    BearerToken(token): BearerToken,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let identity = state.access.authorize(&token, Capability::DeleteContent)?;

    let content = state
        .content
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Podcast not found: {}", id)))?;
    if content.kind != ContentKind::Podcast || content.studio_id != identity.user_id {
        return Err(HttpAppError::from(AppError::NotFound(format!(
            "Podcast not found: {}",
            id
        ))));
    }

    let storage_keys = state.content.delete_cascading(id).await?;

    for key in &storage_keys {
        if let Err(e) = state.gateway.delete_object(key).await {
            tracing::warn!(error = %e, storage_key = %key, "Failed to delete stored object during cleanup");
        }
    }

    tracing::info!(
        podcast_id = %id,
        studio_id = %identity.user_id,
        objects = storage_keys.len(),
        "Podcast deleted"
    );

    Ok(Json(serde_json::json!({ "deleted": true })))
}
