//! Clip routes: creation, listing, sharing with editors, and downloads.

use crate::auth::BearerToken;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use clipcast_core::auth::Capability;
use clipcast_core::models::{Content, ContentKind, ContentStatus, InvitationKind, Role};
use clipcast_core::AppError;
use clipcast_services::{DownloadTracking, NewClip};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateClipRequest {
    pub podcast_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub filename: String,
    #[validate(length(min = 1, max = 255))]
    pub content_type: String,
    #[validate(range(min = 1))]
    pub size_bytes: i64,
    pub start_secs: f64,
    pub end_secs: f64,
}

/// Cut a clip from a podcast
#[utoipa::path(
    post,
    path = "/api/clips",
    tag = "clips",
    request_body = CreateClipRequest,
    responses(
        (status = 200, description = "Clip created", body = Content),
        (status = 400, description = "Invalid offsets", body = ErrorResponse),
        (status = 403, description = "No access to the podcast", body = ErrorResponse),
        (status = 404, description = "Podcast not found", body = ErrorResponse)
    )
)]
pub async fn create_clip(
    BearerToken(token): BearerToken,
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateClipRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    // Studios manage their own catalog; agencies need the clip capability.
    let role = state.codec.decode(&token)?.role;
    let capability = match role {
        Role::Studio => Capability::ManageContent,
        _ => Capability::CreateClips,
    };
    let identity = state.access.authorize(&token, capability)?;
    request.validate().map_err(AppError::from)?;

    let clip = state
        .clips
        .create_clip(
            identity.user_id,
            identity.role,
            NewClip {
                parent_id: request.podcast_id,
                title: request.title,
                description: request.description,
                filename: request.filename,
                content_type: request.content_type,
                size_bytes: request.size_bytes,
                start_secs: request.start_secs,
                end_secs: request.end_secs,
            },
        )
        .await?;

    Ok(Json(clip))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListClipsQuery {
    /// Restrict to clips of one podcast.
    pub podcast_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClipSummary {
    #[serde(flatten)]
    pub content: Content,
    /// Downloads through the caller's grant; editor listings only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_count: Option<i64>,
}

/// List clips visible to the caller
#[utoipa::path(
    get,
    path = "/api/clips",
    tag = "clips",
    params(("podcast_id" = Option<Uuid>, Query, description = "Restrict to clips of one podcast")),
    responses(
        (status = 200, description = "Visible clips", body = [ClipSummary]),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn list_clips(
    BearerToken(token): BearerToken,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListClipsQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let identity = state.codec.decode(&token)?;

    let visible = state
        .access
        .list_visible_content(identity.user_id, identity.role)
        .await?;

    let mut clips = Vec::new();
    for content in visible.into_iter().filter(|c| {
        c.kind == ContentKind::Clip
            && query
                .podcast_id
                .map(|parent| c.parent_id == Some(parent))
                .unwrap_or(true)
    }) {
        let download_count = if identity.role == Role::Editor {
            state
                .grants
                .get_active(content.id, identity.user_id)
                .await?
                .map(|g| g.download_count)
        } else {
            None
        };
        clips.push(ClipSummary {
            content,
            download_count,
        });
    }

    Ok(Json(clips))
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct GrantClipAccessRequest {
    #[validate(length(min = 1, message = "Editor emails are required"))]
    pub editor_emails: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GrantClipAccessResponse {
    /// Emails granted directly (already-registered editors).
    pub granted: Vec<String>,
    /// Emails that received an invitation instead.
    pub invited: Vec<String>,
}

/// Share a clip with editors by email
///
/// Registered editors are granted directly; unknown addresses receive a
/// single-use invitation that converts into a grant on acceptance.
#[utoipa::path(
    post,
    path = "/api/clips/{id}/access",
    tag = "clips",
    params(("id" = Uuid, Path, description = "Clip ID")),
    request_body = GrantClipAccessRequest,
    responses(
        (status = 200, description = "Access granted and/or invitations sent", body = GrantClipAccessResponse),
        (status = 403, description = "Insufficient permission", body = ErrorResponse),
        (status = 404, description = "Clip not found", body = ErrorResponse)
    )
)]
pub async fn grant_clip_access(
    BearerToken(token): BearerToken,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<GrantClipAccessRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let identity = state.access.authorize(&token, Capability::ShareClips)?;
    request.validate().map_err(AppError::from)?;

    let editors = state
        .users
        .list_active_by_emails(&request.editor_emails, Role::Editor)
        .await?;

    let mut granted = Vec::new();
    for editor in &editors {
        state
            .access
            .grant_access(identity.user_id, id, editor.id)
            .await?;
        granted.push(editor.email.clone());
    }

    let mut invited = Vec::new();
    for email in &request.editor_emails {
        if granted.contains(email) {
            continue;
        }
        state
            .invites
            .issue(identity.user_id, id, email, InvitationKind::ClipAccess)
            .await?;
        invited.push(email.clone());
    }

    tracing::info!(
        clip_id = %id,
        granted = granted.len(),
        invited = invited.len(),
        "Clip shared"
    );

    Ok(Json(GrantClipAccessResponse { granted, invited }))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateClipStatusRequest {
    pub status: ContentStatus,
}

/// Report the outcome of clip processing
///
/// Called by the byte producer (cutting pipeline or capture uploader) once
/// the clip media exists, moving the record out of `processing`.
#[utoipa::path(
    put,
    path = "/api/clips/{id}/status",
    tag = "clips",
    params(("id" = Uuid, Path, description = "Clip ID")),
    request_body = UpdateClipStatusRequest,
    responses(
        (status = 200, description = "Status updated"),
        (status = 404, description = "Clip not found", body = ErrorResponse)
    )
)]
pub async fn update_clip_status(
    BearerToken(token): BearerToken,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateClipStatusRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let identity = state.codec.decode(&token)?;

    let content = state
        .content
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Clip not found: {}", id)))?;
    if content.kind != ContentKind::Clip || !content.is_owned_by(identity.user_id) {
        return Err(HttpAppError::from(AppError::NotFound(format!(
            "Clip not found: {}",
            id
        ))));
    }

    state.content.update_status(id, request.status).await?;

    tracing::info!(clip_id = %id, status = ?request.status, "Clip status updated");

    Ok(Json(serde_json::json!({ "updated": true })))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DownloadClipResponse {
    pub content_id: Uuid,
    pub download_url: String,
    /// Counter value after this download; editor downloads only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_count: Option<i64>,
}

/// Download a clip
///
/// Editors download through their grant (the usage counter moves); agencies
/// and studios download their own clips without a counter.
#[utoipa::path(
    post,
    path = "/api/clips/{id}/download",
    tag = "clips",
    params(("id" = Uuid, Path, description = "Clip ID")),
    responses(
        (status = 200, description = "Download URL", body = DownloadClipResponse),
        (status = 403, description = "No access", body = ErrorResponse),
        (status = 404, description = "Clip not found", body = ErrorResponse)
    )
)]
pub async fn download_clip(
    BearerToken(token): BearerToken,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let identity = state.codec.decode(&token)?;

    let content = state
        .content
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Clip not found: {}", id)))?;
    if content.kind != ContentKind::Clip {
        return Err(HttpAppError::from(AppError::NotFound(format!(
            "Clip not found: {}",
            id
        ))));
    }

    // Mint the read authorization first: the counter only moves for a
    // download that is actually handed out.
    let download_url = state
        .gateway
        .authorize_read(
            &content.storage_key,
            Duration::from_secs(state.config.read_url_ttl_secs),
        )
        .await?;

    let tracking = state
        .access
        .track_download(identity.user_id, identity.role, id)
        .await?;

    let download_count = match tracking {
        DownloadTracking::Counted { download_count } => Some(download_count),
        DownloadTracking::OwnerDownload => None,
    };

    Ok(Json(DownloadClipResponse {
        content_id: id,
        download_url,
        download_count,
    }))
}
