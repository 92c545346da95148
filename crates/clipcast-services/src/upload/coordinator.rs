//! Multipart upload coordination.
//!
//! Drives a large-file transfer to durable storage without holding the whole
//! file in memory, and leaves the system consistent on any failure: a
//! content record exists only after the backend confirmed assembly, and
//! abort is always safe to call.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use uuid::Uuid;

use clipcast_core::constants::SUPPORTED_CONTENT_TYPES;
use clipcast_core::models::{
    Content, ContentKind, ContentStatus, NewContent, PartAuthorization, PartReceipt,
};
use clipcast_core::repo::ContentStore;
use clipcast_core::{AppError, Config};
use clipcast_storage::{keys, StorageGateway};

use super::session::UploadSession;

/// Size and TTL limits applied by the coordinator.
#[derive(Debug, Clone)]
pub struct UploadLimits {
    pub max_size_bytes: u64,
    pub part_size_bytes: u64,
    pub part_url_ttl: Duration,
    pub read_url_ttl: Duration,
}

impl UploadLimits {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_size_bytes: config.max_upload_size_bytes,
            part_size_bytes: config.upload_part_size_bytes,
            part_url_ttl: Duration::from_secs(config.part_url_ttl_secs),
            read_url_ttl: Duration::from_secs(config.read_url_ttl_secs),
        }
    }
}

/// Metadata for the content record created when an upload completes.
#[derive(Debug, Clone)]
pub struct UploadMetadata {
    pub title: String,
    pub description: Option<String>,
    pub original_name: Option<String>,
    pub duration_secs: Option<f64>,
    /// Owning studio.
    pub studio_id: Uuid,
}

/// An open session plus the per-part authorizations the client uploads with.
#[derive(Debug)]
pub struct OpenedSession {
    pub session: UploadSession,
    pub part_authorizations: Vec<PartAuthorization>,
}

/// Check that `receipts` covers exactly parts 1..=part_count with non-empty
/// tags, and return them sorted ascending. No backend call is made when this
/// fails; the remote would only produce a confusing error for a gap we can
/// detect locally.
pub fn validate_receipts(
    part_count: i32,
    mut receipts: Vec<PartReceipt>,
) -> Result<Vec<PartReceipt>, AppError> {
    receipts.sort_by_key(|r| r.part_number);

    let mut expected = 1;
    for receipt in &receipts {
        if receipt.part_number != expected {
            return Err(AppError::IncompleteUpload(format!(
                "Receipt set does not cover part {} (got part {})",
                expected, receipt.part_number
            )));
        }
        if receipt.receipt_tag.is_empty() {
            return Err(AppError::IncompleteUpload(format!(
                "Empty receipt tag for part {}",
                receipt.part_number
            )));
        }
        expected += 1;
    }

    if expected != part_count + 1 {
        return Err(AppError::IncompleteUpload(format!(
            "Receipt set covers {} of {} parts",
            receipts.len(),
            part_count
        )));
    }

    Ok(receipts)
}

/// Coordinates the multipart session lifecycle against the storage gateway
/// and persists the finished artifact.
pub struct UploadCoordinator {
    gateway: Arc<dyn StorageGateway>,
    content: Arc<dyn ContentStore>,
    limits: UploadLimits,
}

impl UploadCoordinator {
    pub fn new(
        gateway: Arc<dyn StorageGateway>,
        content: Arc<dyn ContentStore>,
        limits: UploadLimits,
    ) -> Self {
        Self {
            gateway,
            content,
            limits,
        }
    }

    /// Open a multipart session: compute the part layout and obtain one
    /// time-bounded upload authorization per part.
    pub async fn open_session(
        &self,
        filename: &str,
        content_type: &str,
        size_bytes: u64,
    ) -> Result<OpenedSession, AppError> {
        if size_bytes == 0 {
            return Err(AppError::InvalidInput(
                "Upload size must be greater than 0".to_string(),
            ));
        }
        if size_bytes > self.limits.max_size_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "Upload size {} exceeds maximum {} bytes",
                size_bytes, self.limits.max_size_bytes
            )));
        }
        if !SUPPORTED_CONTENT_TYPES.contains(&content_type) {
            return Err(AppError::InvalidInput(format!(
                "Unsupported content type: {}. Supported: {}",
                content_type,
                SUPPORTED_CONTENT_TYPES.join(", ")
            )));
        }

        let file_id = Uuid::new_v4();
        let storage_key = keys::podcast_key(file_id, filename);

        let session_id = self
            .gateway
            .create_session(&storage_key, content_type)
            .await
            .map_err(AppError::from)?;

        let session = UploadSession::new(
            session_id,
            storage_key,
            content_type.to_string(),
            size_bytes,
            self.limits.part_size_bytes,
        );

        let mut part_authorizations = Vec::with_capacity(session.part_count() as usize);
        for part_number in 1..=session.part_count() {
            let authorization = self
                .gateway
                .authorize_part(
                    &session.session_id,
                    &session.storage_key,
                    part_number,
                    self.limits.part_url_ttl,
                )
                .await
                .map_err(AppError::from)?;
            part_authorizations.push(authorization);
        }

        tracing::info!(
            session_id = %session.session_id,
            storage_key = %session.storage_key,
            size_bytes = size_bytes,
            part_count = session.part_count(),
            "Upload session opened"
        );

        Ok(OpenedSession {
            session,
            part_authorizations,
        })
    }

    /// Relay one part through the gateway and record its receipt.
    ///
    /// Transport failures surface to the caller for retry; the coordinator
    /// itself applies no retry policy. Re-sending a part number is
    /// idempotent on the backend and does not double-count progress.
    pub async fn upload_part(
        &self,
        session: &mut UploadSession,
        part_number: i32,
        bytes: Bytes,
    ) -> Result<(), AppError> {
        if part_number < 1 || part_number > session.part_count() {
            return Err(AppError::InvalidInput(format!(
                "Part number {} out of range 1..={}",
                part_number,
                session.part_count()
            )));
        }

        let receipt_tag = self
            .gateway
            .upload_part(
                &session.session_id,
                &session.storage_key,
                part_number,
                bytes,
            )
            .await
            .map_err(AppError::from)?;

        session.record_part(part_number, receipt_tag)
    }

    /// Finalize the session: verify receipt coverage, assemble the object,
    /// persist the content record, and mint a playback authorization.
    ///
    /// Receipts may arrive in any order; they are sorted before the backend
    /// call. A gap fails with `IncompleteUpload` and issues no backend call,
    /// and no content record is created on any failure path.
    pub async fn complete_session(
        &self,
        session: &UploadSession,
        receipts: Vec<PartReceipt>,
        metadata: UploadMetadata,
    ) -> Result<(Content, String), AppError> {
        let ordered = validate_receipts(session.part_count(), receipts)?;

        let completed = self
            .gateway
            .complete_session(&session.session_id, &session.storage_key, &ordered)
            .await
            .map_err(AppError::from)?;

        let content = self
            .content
            .create(NewContent {
                kind: ContentKind::Podcast,
                title: metadata.title,
                description: metadata.description,
                studio_id: metadata.studio_id,
                agency_id: None,
                filename: session
                    .storage_key
                    .rsplit('/')
                    .next()
                    .unwrap_or(&session.storage_key)
                    .to_string(),
                original_name: metadata.original_name,
                content_type: session.content_type.clone(),
                size_bytes: session.total_size as i64,
                duration_secs: metadata.duration_secs,
                storage_key: session.storage_key.clone(),
                parent_id: None,
                clip_range: None,
                status: ContentStatus::Processed,
            })
            .await?;

        let playback_url = self
            .gateway
            .authorize_read(&session.storage_key, self.limits.read_url_ttl)
            .await
            .map_err(AppError::from)?;

        tracing::info!(
            session_id = %session.session_id,
            content_id = %content.id,
            storage_key = %session.storage_key,
            location = %completed.location,
            "Upload session completed"
        );

        Ok((content, playback_url))
    }

    /// Best-effort cleanup of all parts received so far.
    ///
    /// Abort is itself a failure-recovery path, so backend errors are
    /// logged, never raised. Safe to call at any point before finalization,
    /// including after a failed completion; call it on user cancellation
    /// before dropping local state so no orphaned session keeps billing.
    pub async fn abort_session(&self, session: &UploadSession) {
        self.abort(&session.session_id, &session.storage_key).await;
    }

    /// Abort by raw session handle, for callers that no longer hold the
    /// session value (e.g. a cancellation request arriving on its own).
    pub async fn abort(&self, session_id: &str, storage_key: &str) {
        if let Err(e) = self.gateway.abort_session(session_id, storage_key).await {
            tracing::warn!(
                error = %e,
                session_id = %session_id,
                storage_key = %storage_key,
                "Failed to abort upload session"
            );
        } else {
            tracing::info!(
                session_id = %session_id,
                storage_key = %storage_key,
                "Upload session aborted"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn receipt(part_number: i32, tag: &str) -> PartReceipt {
        PartReceipt {
            part_number,
            receipt_tag: tag.to_string(),
        }
    }

    #[test]
    fn validate_receipts_accepts_full_coverage_in_any_order() {
        let ordered = validate_receipts(
            3,
            vec![receipt(3, "c"), receipt(1, "a"), receipt(2, "b")],
        )
        .unwrap();
        let parts: Vec<i32> = ordered.iter().map(|r| r.part_number).collect();
        assert_eq!(parts, vec![1, 2, 3]);
    }

    #[test]
    fn validate_receipts_rejects_gap() {
        let err = validate_receipts(3, vec![receipt(1, "a"), receipt(3, "c")]).unwrap_err();
        assert!(matches!(err, AppError::IncompleteUpload(_)));
    }

    #[test]
    fn validate_receipts_rejects_short_set() {
        let err = validate_receipts(3, vec![receipt(1, "a"), receipt(2, "b")]).unwrap_err();
        assert!(matches!(err, AppError::IncompleteUpload(_)));
    }

    #[test]
    fn validate_receipts_rejects_empty_tag() {
        let err =
            validate_receipts(2, vec![receipt(1, "a"), receipt(2, "")]).unwrap_err();
        assert!(matches!(err, AppError::IncompleteUpload(_)));
    }

    #[test]
    fn validate_receipts_rejects_duplicate_part() {
        let err = validate_receipts(2, vec![receipt(1, "a"), receipt(1, "a2")]).unwrap_err();
        assert!(matches!(err, AppError::IncompleteUpload(_)));
    }
}
