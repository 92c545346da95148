//! Resumable multipart upload coordination.

pub mod coordinator;
pub mod session;

pub use coordinator::{
    validate_receipts, OpenedSession, UploadCoordinator, UploadLimits, UploadMetadata,
};
pub use session::UploadSession;
