//! Error types module
//!
//! All errors are unified under the `AppError` enum which covers database,
//! storage-backend, authorization, and lifecycle errors for the sharing core.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx`
//! feature so the domain crate can be used without a database driver.

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented.
/// This trait allows errors to self-describe their HTTP response characteristics.
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "INVALID_CREDENTIAL")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    /// Malformed, forged, or expired bearer credential.
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    /// Valid credential whose role lacks the required capability.
    #[error("Insufficient permission: {0}")]
    InsufficientPermission(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Invitation token consumed by an earlier (possibly concurrent) accept.
    #[error("Invitation already used")]
    AlreadyUsed,

    /// Unknown, used, or expired invitation token. Deliberately coarse so the
    /// caller cannot distinguish which condition applied.
    #[error("Invalid or expired invitation")]
    InvalidOrExpired,

    /// Completion attempted with a receipt set that does not cover every part.
    #[error("Incomplete upload: {0}")]
    IncompleteUpload(String),

    /// The storage backend could not allocate a multipart session.
    #[error("Upload session creation failed: {0}")]
    SessionCreation(String),

    /// Transport failure talking to the storage backend.
    #[error("Storage backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("UUID parsing error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(format!("Validation error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable,
/// suggested_action, sensitive, log_level). client_message stays per-variant
/// for dynamic content.
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::Database(_) => (
            500,
            "DATABASE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::InvalidCredential(_) => (
            401,
            "INVALID_CREDENTIAL",
            false,
            Some("Re-authenticate and retry with a fresh token"),
            false,
            LogLevel::Debug,
        ),
        AppError::InsufficientPermission(_) => (
            403,
            "INSUFFICIENT_PERMISSION",
            false,
            Some("Use an account whose role holds this capability"),
            false,
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the resource ID exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::AlreadyUsed => (
            409,
            "INVITATION_ALREADY_USED",
            false,
            Some("Request a new invitation from the granter"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidOrExpired => (
            410,
            "INVITATION_INVALID_OR_EXPIRED",
            false,
            Some("Request a new invitation from the granter"),
            false,
            LogLevel::Debug,
        ),
        AppError::IncompleteUpload(_) => (
            400,
            "INCOMPLETE_UPLOAD",
            true,
            Some("Upload the missing parts and retry completion"),
            false,
            LogLevel::Debug,
        ),
        AppError::SessionCreation(_) => (
            502,
            "SESSION_CREATION_FAILED",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::BackendUnavailable(_) => (
            502,
            "STORAGE_BACKEND_UNAVAILABLE",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Conflict(_) => (
            409,
            "CONFLICT",
            false,
            None,
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::PayloadTooLarge(_) => (
            413,
            "PAYLOAD_TOO_LARGE",
            false,
            Some("Reduce file size"),
            false,
            LogLevel::Debug,
        ),
        AppError::Internal(_) => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Database(_) => "Database",
            AppError::InvalidCredential(_) => "InvalidCredential",
            AppError::InsufficientPermission(_) => "InsufficientPermission",
            AppError::NotFound(_) => "NotFound",
            AppError::AlreadyUsed => "AlreadyUsed",
            AppError::InvalidOrExpired => "InvalidOrExpired",
            AppError::IncompleteUpload(_) => "IncompleteUpload",
            AppError::SessionCreation(_) => "SessionCreation",
            AppError::BackendUnavailable(_) => "BackendUnavailable",
            AppError::Conflict(_) => "Conflict",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::InvalidCredential(_) => "Invalid or expired credential".to_string(),
            AppError::InsufficientPermission(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::AlreadyUsed => "This invitation has already been used".to_string(),
            AppError::InvalidOrExpired => "Invalid or expired invitation".to_string(),
            AppError::IncompleteUpload(ref msg) => msg.clone(),
            AppError::SessionCreation(_) => "Failed to create upload session".to_string(),
            AppError::BackendUnavailable(_) => "Storage backend unavailable".to_string(),
            AppError::Conflict(ref msg) => msg.clone(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::PayloadTooLarge(ref msg) => msg.clone(),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_invalid_credential() {
        let err = AppError::InvalidCredential("signature mismatch".to_string());
        assert_eq!(err.http_status_code(), 401);
        assert_eq!(err.error_code(), "INVALID_CREDENTIAL");
        assert!(!err.is_recoverable());
        assert_eq!(err.client_message(), "Invalid or expired credential");
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_error_metadata_insufficient_permission() {
        let err = AppError::InsufficientPermission("editor cannot upload".to_string());
        assert_eq!(err.http_status_code(), 403);
        assert_eq!(err.error_code(), "INSUFFICIENT_PERMISSION");
        assert_eq!(err.client_message(), "editor cannot upload");
    }

    #[test]
    fn test_error_metadata_invitation_lifecycle() {
        assert_eq!(AppError::AlreadyUsed.http_status_code(), 409);
        assert_eq!(AppError::InvalidOrExpired.http_status_code(), 410);
        // The coarse variant must not leak which condition applied.
        assert_eq!(
            AppError::InvalidOrExpired.client_message(),
            "Invalid or expired invitation"
        );
    }

    #[test]
    fn test_error_metadata_incomplete_upload_is_retryable() {
        let err = AppError::IncompleteUpload("missing parts: [2]".to_string());
        assert_eq!(err.http_status_code(), 400);
        assert!(err.is_recoverable());
        assert_eq!(
            err.suggested_action(),
            Some("Upload the missing parts and retry completion")
        );
    }

    #[test]
    fn test_error_metadata_backend_errors_are_sensitive() {
        let err = AppError::BackendUnavailable("connection reset".to_string());
        assert_eq!(err.http_status_code(), 502);
        assert!(err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Error);
        assert_eq!(err.client_message(), "Storage backend unavailable");
    }
}
