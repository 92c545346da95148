//! OpenAPI documentation aggregation.

use utoipa::OpenApi;

use crate::error::ErrorResponse;
use crate::handlers::{auth, clips, invites, podcasts, uploads};
use clipcast_core::auth::Capability;
use clipcast_core::models::{
    AbortUploadRequest, CompleteUploadRequest, CompleteUploadResponse, Content, ContentKind,
    ContentStatus, InvitationKind, OpenUploadRequest, OpenUploadResponse, PartAuthorization,
    PartReceipt, Role,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register,
        auth::login,
        uploads::open_upload,
        uploads::relay_part,
        uploads::complete_upload,
        uploads::abort_upload,
        podcasts::list_podcasts,
        podcasts::get_podcast,
        podcasts::update_podcast,
        podcasts::playback_podcast,
        podcasts::delete_podcast,
        clips::create_clip,
        clips::list_clips,
        clips::grant_clip_access,
        clips::download_clip,
        clips::update_clip_status,
        invites::send_invite,
        invites::validate_invite,
        invites::accept_invite,
    ),
    components(schemas(
        ErrorResponse,
        Role,
        Capability,
        ContentKind,
        ContentStatus,
        InvitationKind,
        Content,
        OpenUploadRequest,
        OpenUploadResponse,
        CompleteUploadRequest,
        CompleteUploadResponse,
        AbortUploadRequest,
        PartAuthorization,
        PartReceipt,
        auth::RegisterRequest,
        auth::LoginRequest,
        auth::AuthResponse,
        auth::UserResponse,
        podcasts::PodcastSummary,
        podcasts::PlaybackResponse,
        podcasts::UpdatePodcastRequest,
        clips::CreateClipRequest,
        clips::ClipSummary,
        clips::UpdateClipStatusRequest,
        clips::GrantClipAccessRequest,
        clips::GrantClipAccessResponse,
        clips::DownloadClipResponse,
        invites::SendInviteRequest,
        invites::SendInviteResponse,
        invites::ValidateInviteRequest,
        invites::ValidateInviteResponse,
        invites::AcceptInviteRequest,
        invites::AcceptInviteResponse,
    )),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "uploads", description = "Resumable multipart uploads"),
        (name = "podcasts", description = "Long-form content"),
        (name = "clips", description = "Clips cut from podcasts"),
        (name = "invites", description = "Invitation lifecycle"),
    )
)]
pub struct ApiDoc;
