//! Storage gateway abstraction
//!
//! This module defines the StorageGateway trait that all storage backends
//! must implement: multipart session lifecycle (create, per-part
//! authorization, complete, abort) plus time-bounded read authorization.

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;

use clipcast_core::models::{CompletedObject, PartAuthorization, PartReceipt};

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not allocate a multipart session.
    #[error("Session creation failed: {0}")]
    SessionCreation(String),

    /// Transport failure talking to the backend.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Part upload failed: {0}")]
    PartUploadFailed(String),

    #[error("Completion failed: {0}")]
    CompletionFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for clipcast_core::AppError {
    fn from(err: StorageError) -> Self {
        use clipcast_core::AppError;
        match err {
            StorageError::SessionCreation(msg) => AppError::SessionCreation(msg),
            StorageError::BackendUnavailable(msg) => AppError::BackendUnavailable(msg),
            StorageError::PartUploadFailed(msg) => AppError::BackendUnavailable(msg),
            StorageError::CompletionFailed(msg) => AppError::BackendUnavailable(msg),
            StorageError::NotFound(msg) => AppError::NotFound(msg),
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            StorageError::IoError(err) => AppError::Internal(format!("IO error: {}", err)),
            StorageError::ConfigError(msg) => AppError::Internal(msg),
        }
    }
}

/// Storage gateway abstraction
///
/// All storage backends (S3, local filesystem) must implement this trait.
/// The upload coordinator drives the multipart session lifecycle exclusively
/// through it and never touches backend wire details.
///
/// Part numbers are 1-based and contiguous. `complete_session` requires
/// receipts in strictly ascending part-number order; callers are expected to
/// sort before invoking.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Allocate a multipart session for `key` and return its opaque id.
    async fn create_session(&self, key: &str, content_type: &str) -> StorageResult<String>;

    /// Mint a time-bounded authorization for uploading one part directly to
    /// the backend.
    async fn authorize_part(
        &self,
        session_id: &str,
        key: &str,
        part_number: i32,
        ttl: Duration,
    ) -> StorageResult<PartAuthorization>;

    /// Relay one part through the gateway and return its receipt tag.
    ///
    /// Re-uploading the same part number overwrites the prior attempt on the
    /// backend; there is no side effect beyond bandwidth.
    async fn upload_part(
        &self,
        session_id: &str,
        key: &str,
        part_number: i32,
        bytes: Bytes,
    ) -> StorageResult<String>;

    /// Assemble the object from `receipts` (strictly ascending part numbers).
    async fn complete_session(
        &self,
        session_id: &str,
        key: &str,
        receipts: &[PartReceipt],
    ) -> StorageResult<CompletedObject>;

    /// Discard all parts received so far. Idempotent and tolerant of
    /// already-gone sessions.
    async fn abort_session(&self, session_id: &str, key: &str) -> StorageResult<()>;

    /// Mint a time-bounded read authorization for a stored object.
    async fn authorize_read(&self, key: &str, ttl: Duration) -> StorageResult<String>;

    /// Delete a stored object. Tolerant of already-deleted objects.
    async fn delete_object(&self, key: &str) -> StorageResult<()>;
}
