//! Invitation routes: issue, validate, accept.

use crate::auth::BearerToken;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use clipcast_core::auth::Capability;
use clipcast_core::models::InvitationKind;
use clipcast_core::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SendInviteRequest {
    pub content_id: Uuid,
    #[validate(email(message = "Invalid recipient email"))]
    pub recipient_email: String,
    /// Invitation kind; defaults to podcast access.
    #[serde(default = "default_kind")]
    pub kind: InvitationKind,
}

fn default_kind() -> InvitationKind {
    InvitationKind::ContentAccess
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SendInviteResponse {
    pub invitation_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Issue an invitation
///
/// The invitation stands even if the notification email fails; the token is
/// the durable artifact.
#[utoipa::path(
    post,
    path = "/api/invites/send",
    tag = "invites",
    request_body = SendInviteRequest,
    responses(
        (status = 200, description = "Invitation issued", body = SendInviteResponse),
        (status = 403, description = "Insufficient permission", body = ErrorResponse),
        (status = 404, description = "Content not found or not delegable", body = ErrorResponse)
    )
)]
pub async fn send_invite(
    BearerToken(token): BearerToken,
    State(state): State<Arc<AppState>>,
    Json(request): Json<SendInviteRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let capability = match request.kind {
        InvitationKind::ContentAccess => Capability::ShareContent,
        InvitationKind::ClipAccess => Capability::ShareClips,
    };
    let identity = state.access.authorize(&token, capability)?;
    request.validate().map_err(AppError::from)?;

    let invitation = state
        .invites
        .issue(
            identity.user_id,
            request.content_id,
            &request.recipient_email,
            request.kind,
        )
        .await?;

    Ok(Json(SendInviteResponse {
        invitation_id: invitation.id,
        expires_at: invitation.expires_at,
    }))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ValidateInviteRequest {
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ValidateInviteResponse {
    pub kind: InvitationKind,
    pub content_title: String,
    pub recipient_email: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Validate an invitation token without consuming it
///
/// Unknown, used, and expired tokens are indistinguishable in the response.
#[utoipa::path(
    post,
    path = "/api/invites/validate",
    tag = "invites",
    request_body = ValidateInviteRequest,
    responses(
        (status = 200, description = "Invitation context", body = ValidateInviteResponse),
        (status = 410, description = "Invalid or expired invitation", body = ErrorResponse)
    )
)]
pub async fn validate_invite(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ValidateInviteRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let preview = state.invites.validate(&request.token).await?;

    Ok(Json(ValidateInviteResponse {
        kind: preview.kind,
        content_title: preview.content_title,
        recipient_email: preview.recipient_email,
        created_at: preview.created_at,
        expires_at: preview.expires_at,
    }))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AcceptInviteRequest {
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AcceptInviteResponse {
    pub grant_id: Uuid,
    pub content_id: Uuid,
}

/// Accept an invitation
///
/// Exactly-once: of concurrent accepts on the same token, one wins and the
/// rest observe a conflict, with no duplicate grant.
#[utoipa::path(
    post,
    path = "/api/invites/accept",
    tag = "invites",
    request_body = AcceptInviteRequest,
    responses(
        (status = 200, description = "Invitation redeemed into a grant", body = AcceptInviteResponse),
        (status = 409, description = "Invitation already used", body = ErrorResponse),
        (status = 410, description = "Invalid or expired invitation", body = ErrorResponse)
    )
)]
pub async fn accept_invite(
    BearerToken(token): BearerToken,
    State(state): State<Arc<AppState>>,
    Json(request): Json<AcceptInviteRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let identity = state.codec.decode(&token)?;

    let grant = state.invites.accept(&request.token, identity.user_id).await?;

    Ok(Json(AcceptInviteResponse {
        grant_id: grant.id,
        content_id: grant.content_id,
    }))
}
