//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use clipcast_core::auth::TokenCodec;
use clipcast_core::Config;
use clipcast_db::{AccessGrantRepository, ContentRepository, UserRepository};
use clipcast_services::{
    AccessControlService, ClipService, InvitationService, UploadCoordinator,
};
use clipcast_storage::StorageGateway;

pub struct AppState {
    pub config: Config,
    pub pool: PgPool,
    pub codec: TokenCodec,
    pub gateway: Arc<dyn StorageGateway>,
    // Repositories
    pub users: UserRepository,
    pub content: ContentRepository,
    pub grants: AccessGrantRepository,
    // Services
    pub access: Arc<AccessControlService>,
    pub clips: Arc<ClipService>,
    pub invites: Arc<InvitationService>,
    pub uploads: Arc<UploadCoordinator>,
}
