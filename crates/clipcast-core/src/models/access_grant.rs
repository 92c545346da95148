use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::Capability;

/// Lifecycle state of a grant. Revocation is a logical delete; a revoked
/// grant can only go back to `Active` (re-grant), never to absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "grant_state", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum GrantState {
    Active,
    Revoked,
}

/// A directed access edge: grantee may exercise `capabilities` on one
/// content item. Unique per (content_id, grantee_id); re-granting updates
/// the existing row rather than inserting a duplicate.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccessGrant {
    pub id: Uuid,
    pub content_id: Uuid,
    pub grantee_id: Uuid,
    pub granter_id: Uuid,
    /// Capability subset delegated with this grant.
    pub capabilities: Vec<Capability>,
    pub state: GrantState,
    /// Successful downloads through this grant. Survives revocation and
    /// re-grant; never reset.
    pub download_count: i64,
    pub last_download_at: Option<DateTime<Utc>>,
    pub granted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AccessGrant {
    pub fn is_active(&self) -> bool {
        self.state == GrantState::Active
    }
}
