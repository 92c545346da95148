//! Static role/capability mapping.
//!
//! Every protected operation consults this matrix through
//! [`PermissionMatrix::allows`]. Roles carry a fixed capability set; there is
//! no per-user customization at the authorization layer (grants narrow
//! *which* content an operation touches, not *whether* the operation is
//! available to the role).

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Role;

/// One atomic permission in a role's static set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    // Studio
    UploadContent,
    ShareContent,
    ManageContent,
    ViewAnalytics,
    DeleteContent,
    // Agency
    CreateClips,
    ShareClips,
    ManageEditors,
    ViewAssignedContent,
    DeleteOwnClips,
    // Editor
    DownloadClips,
    ViewAssignedClips,
}

/// Static mapping from role to capability set.
pub struct PermissionMatrix;

impl PermissionMatrix {
    /// The fixed capability set for a role.
    pub fn capabilities(role: Role) -> &'static [Capability] {
        match role {
            Role::Studio => &[
                Capability::UploadContent,
                Capability::ShareContent,
                Capability::ManageContent,
                Capability::ViewAnalytics,
                Capability::DeleteContent,
            ],
            Role::Agency => &[
                Capability::CreateClips,
                Capability::ShareClips,
                Capability::ManageEditors,
                Capability::ViewAssignedContent,
                Capability::DeleteOwnClips,
            ],
            Role::Editor => &[Capability::DownloadClips, Capability::ViewAssignedClips],
        }
    }

    /// Whether `role` holds `capability`.
    pub fn allows(role: Role, capability: Capability) -> bool {
        Self::capabilities(role).contains(&capability)
    }
}
