//! Clipcast Services Library
//!
//! The core services of the sharing platform: resumable multipart upload
//! coordination, role-scoped access control, clip creation, and the
//! invitation lifecycle, plus the notification channel invitations use.

pub mod access;
pub mod clip;
pub mod invite;
pub mod notify;
pub mod upload;

pub use access::{AccessControlService, DownloadTracking};
pub use clip::{ClipService, NewClip};
pub use invite::{InvitationPreview, InvitationService};
pub use notify::{InviteContext, Notifier, NoopNotifier, SmtpNotifier};
pub use upload::{OpenedSession, UploadCoordinator, UploadLimits, UploadMetadata, UploadSession};
