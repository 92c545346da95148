use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Time-bounded authorization to upload one part directly to the backend.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PartAuthorization {
    /// Part number (1-based).
    pub part_number: i32,
    /// Presigned URL the client PUTs the part bytes to.
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// Backend-issued proof that a specific part was stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PartReceipt {
    /// Part number (1-based).
    pub part_number: i32,
    /// Opaque receipt tag (e.g. an ETag) required to assemble the object.
    pub receipt_tag: String,
}

/// The durable object produced by a completed multipart session.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CompletedObject {
    /// Backend location URI of the assembled object.
    pub location: String,
    /// Backend checksum of the assembled object, when reported.
    pub checksum: Option<String>,
}

/// Request to open a resumable upload session.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct OpenUploadRequest {
    /// Original filename
    #[validate(length(
        min = 1,
        max = 255,
        message = "Filename must be between 1 and 255 characters"
    ))]
    pub filename: String,
    /// Content type (MIME type)
    #[validate(length(
        min = 1,
        max = 255,
        message = "Content type must be between 1 and 255 characters"
    ))]
    pub content_type: String,
    /// Total file size in bytes
    #[validate(range(min = 1, message = "File size must be at least 1 byte"))]
    pub size_bytes: u64,
}

/// Response describing an open session and its per-part authorizations.
#[derive(Debug, Serialize, ToSchema)]
pub struct OpenUploadResponse {
    /// Opaque session id issued by the storage backend.
    pub session_id: String,
    /// Storage key the object will live under.
    pub storage_key: String,
    /// Fixed part size in bytes.
    pub part_size_bytes: u64,
    /// Total number of parts, `ceil(size / part_size)`.
    pub part_count: i32,
    /// One time-bounded authorization per part.
    pub part_authorizations: Vec<PartAuthorization>,
}

/// Request to finalize a session with the collected receipts.
///
/// The upload state machine is client-driven, so the client sends the
/// session descriptor back rather than the server holding it between
/// requests.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CompleteUploadRequest {
    pub session_id: String,
    pub storage_key: String,
    #[validate(length(min = 1, max = 255))]
    pub content_type: String,
    /// Total file size in bytes, as declared when the session was opened.
    #[validate(range(min = 1))]
    pub size_bytes: u64,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    pub description: Option<String>,
    pub original_name: Option<String>,
    pub duration_secs: Option<f64>,
    /// Receipts collected as parts landed; any order, completion sorts them.
    pub receipts: Vec<PartReceipt>,
}

/// Response after a completed upload: the created content record plus a
/// time-bounded playback authorization.
#[derive(Debug, Serialize, ToSchema)]
pub struct CompleteUploadResponse {
    pub content_id: uuid::Uuid,
    pub storage_key: String,
    pub playback_url: String,
    pub size_bytes: i64,
    pub uploaded_at: DateTime<Utc>,
}

/// Request to abort an in-progress session.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AbortUploadRequest {
    pub session_id: String,
    pub storage_key: String,
}
