//! Resumable upload routes.
//!
//! The state machine is client-driven: open returns the session descriptor
//! and per-part authorizations, the client transfers parts (directly via the
//! presigned URLs, or through the relay route on backends without
//! presigning), and completion receives the descriptor and receipts back.

use crate::auth::BearerToken;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use chrono::Utc;
use clipcast_core::auth::Capability;
use clipcast_core::models::{
    AbortUploadRequest, CompleteUploadRequest, CompleteUploadResponse, OpenUploadRequest,
    OpenUploadResponse, PartReceipt,
};
use clipcast_core::AppError;
use clipcast_services::{UploadMetadata, UploadSession};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;

/// Open a resumable upload session
#[utoipa::path(
    post,
    path = "/api/uploads/open",
    tag = "uploads",
    request_body = OpenUploadRequest,
    responses(
        (status = 200, description = "Session opened", body = OpenUploadResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 502, description = "Backend could not allocate a session", body = ErrorResponse)
    )
)]
pub async fn open_upload(
    BearerToken(token): BearerToken,
    State(state): State<Arc<AppState>>,
    Json(request): Json<OpenUploadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.access.authorize(&token, Capability::UploadContent)?;
    request.validate().map_err(AppError::from)?;

    let opened = state
        .uploads
        .open_session(&request.filename, &request.content_type, request.size_bytes)
        .await?;

    Ok(Json(OpenUploadResponse {
        session_id: opened.session.session_id.clone(),
        storage_key: opened.session.storage_key.clone(),
        part_size_bytes: opened.session.part_size,
        part_count: opened.session.part_count(),
        part_authorizations: opened.part_authorizations,
    }))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PartQuery {
    /// Storage key of the object under upload.
    pub key: String,
}

/// Relay one part through the server
///
/// Used with backends that cannot accept direct PUTs (local storage). The
/// backend-issued receipt tag is returned for the client's receipt list.
#[utoipa::path(
    put,
    path = "/api/uploads/{session_id}/parts/{part_number}",
    tag = "uploads",
    params(
        ("session_id" = String, Path, description = "Upload session ID"),
        ("part_number" = i32, Path, description = "Part number (1-based)"),
        ("key" = String, Query, description = "Storage key of the object under upload")
    ),
    request_body(content = [u8], description = "Raw part bytes", content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Part stored", body = PartReceipt),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 502, description = "Backend unavailable", body = ErrorResponse)
    )
)]
pub async fn relay_part(
    BearerToken(token): BearerToken,
    State(state): State<Arc<AppState>>,
    Path((session_id, part_number)): Path<(String, i32)>,
    Query(query): Query<PartQuery>,
    body: Bytes,
) -> Result<impl IntoResponse, HttpAppError> {
    state.access.authorize(&token, Capability::UploadContent)?;

    if part_number < 1 {
        return Err(HttpAppError::from(AppError::InvalidInput(format!(
            "Part number must be 1-based, got {}",
            part_number
        ))));
    }

    let receipt_tag = state
        .gateway
        .upload_part(&session_id, &query.key, part_number, body)
        .await?;

    Ok(Json(PartReceipt {
        part_number,
        receipt_tag,
    }))
}

/// Complete an upload session
///
/// Verifies that the receipts cover every part before anything reaches the
/// backend, assembles the object, and creates the content record.
#[utoipa::path(
    post,
    path = "/api/uploads/complete",
    tag = "uploads",
    request_body = CompleteUploadRequest,
    responses(
        (status = 200, description = "Upload completed", body = CompleteUploadResponse),
        (status = 400, description = "Receipt set incomplete", body = ErrorResponse),
        (status = 502, description = "Backend unavailable", body = ErrorResponse)
    )
)]
pub async fn complete_upload(
    BearerToken(token): BearerToken,
    State(state): State<Arc<AppState>>,
    Json(request): Json<CompleteUploadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let identity = state.access.authorize(&token, Capability::UploadContent)?;
    request.validate().map_err(AppError::from)?;

    let session = UploadSession::new(
        request.session_id,
        request.storage_key,
        request.content_type,
        request.size_bytes,
        state.config.upload_part_size_bytes,
    );

    let (content, playback_url) = state
        .uploads
        .complete_session(
            &session,
            request.receipts,
            UploadMetadata {
                title: request.title,
                description: request.description,
                original_name: request.original_name,
                duration_secs: request.duration_secs,
                studio_id: identity.user_id,
            },
        )
        .await?;

    Ok(Json(CompleteUploadResponse {
        content_id: content.id,
        storage_key: content.storage_key,
        playback_url,
        size_bytes: content.size_bytes,
        uploaded_at: Utc::now(),
    }))
}

/// Abort an upload session
///
/// Best-effort cleanup; always returns success so a cancelling client never
/// gets stuck on a backend hiccup.
#[utoipa::path(
    post,
    path = "/api/uploads/abort",
    tag = "uploads",
    request_body = AbortUploadRequest,
    responses(
        (status = 200, description = "Session aborted"),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn abort_upload(
    BearerToken(token): BearerToken,
    State(state): State<Arc<AppState>>,
    Json(request): Json<AbortUploadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.access.authorize(&token, Capability::UploadContent)?;

    state
        .uploads
        .abort(&request.session_id, &request.storage_key)
        .await;

    Ok(Json(serde_json::json!({ "aborted": true })))
}
