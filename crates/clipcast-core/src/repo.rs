//! Repository contracts consumed by the core services.
//!
//! The database crate provides sqlx-backed implementations; the services
//! test harness provides in-memory doubles. Grant upserts and invitation
//! consumption carry the atomicity requirements the concurrency model relies
//! on, so implementations must honor the documented semantics, not just the
//! signatures.

use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::Capability;
use crate::error::AppError;
use crate::models::{AccessGrant, Content, Invitation, NewContent, User};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<Content>, AppError>;

    async fn create(&self, content: NewContent) -> Result<Content, AppError>;

    /// All content owned by a studio, newest first.
    async fn list_owned_by_studio(&self, studio_id: Uuid) -> Result<Vec<Content>, AppError>;

    /// Clips a given agency created, newest first.
    async fn list_created_by_agency(&self, agency_id: Uuid) -> Result<Vec<Content>, AppError>;

    async fn list_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Content>, AppError>;
}

#[async_trait]
pub trait GrantStore: Send + Sync {
    /// Upsert keyed by the (content_id, grantee_id) unique constraint.
    ///
    /// Absent -> inserts an active grant with a zero counter. Present
    /// (active or revoked) -> reactivates and refreshes granter and
    /// capabilities, preserving the historical download counter. Must be
    /// race-safe under concurrent calls for the same pair: exactly one row
    /// results.
    async fn upsert_active(
        &self,
        content_id: Uuid,
        grantee_id: Uuid,
        granter_id: Uuid,
        capabilities: &[Capability],
    ) -> Result<AccessGrant, AppError>;

    /// Logical delete: Active -> Revoked. Returns false if no grant exists.
    async fn revoke(&self, content_id: Uuid, grantee_id: Uuid) -> Result<bool, AppError>;

    async fn find_active(
        &self,
        content_id: Uuid,
        grantee_id: Uuid,
    ) -> Result<Option<AccessGrant>, AppError>;

    async fn list_active_for_grantee(&self, grantee_id: Uuid)
        -> Result<Vec<AccessGrant>, AppError>;

    /// Atomic increment of the download counter plus last-used stamp.
    /// Concurrent calls must each be counted (no read-modify-write).
    /// Returns the counter value after the increment.
    async fn record_download(&self, grant_id: Uuid) -> Result<i64, AppError>;
}

#[async_trait]
pub trait InviteStore: Send + Sync {
    async fn insert(&self, invitation: &Invitation) -> Result<(), AppError>;

    async fn find_by_token(&self, token: &str) -> Result<Option<Invitation>, AppError>;

    /// Consume the invitation and materialize its grant as one atomic unit.
    ///
    /// The consume step is a compare-and-set on the used flag: of any number
    /// of concurrent callers exactly one wins. Losers get
    /// [`AppError::AlreadyUsed`]; unknown or expired tokens get
    /// [`AppError::InvalidOrExpired`]. The winner's grant is created (or
    /// reactivated) with the invitation's granter before the unit commits;
    /// a token is never left consumed without its grant.
    async fn consume_into_grant(
        &self,
        token: &str,
        grantee_id: Uuid,
        capabilities: &[Capability],
    ) -> Result<(Invitation, AccessGrant), AppError>;
}
