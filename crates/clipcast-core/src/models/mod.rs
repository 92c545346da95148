//! Core domain models shared across all clipcast components.

pub mod access_grant;
pub mod content;
pub mod invitation;
pub mod upload;
pub mod user;

pub use access_grant::{AccessGrant, GrantState};
pub use content::{ClipRange, Content, ContentKind, ContentStatus, NewContent};
pub use invitation::{Invitation, InvitationKind, InvitationState};
pub use upload::{
    AbortUploadRequest, CompleteUploadRequest, CompleteUploadResponse, CompletedObject,
    OpenUploadRequest, OpenUploadResponse, PartAuthorization, PartReceipt,
};
pub use user::{Role, User};
