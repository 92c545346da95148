//! Application initialization: database, storage gateway, services, routes.

pub mod database;
pub mod routes;
pub mod server;
pub mod telemetry;

use std::sync::Arc;

use anyhow::Result;
use axum::Router;

use clipcast_core::auth::TokenCodec;
use clipcast_core::Config;
use clipcast_db::{
    AccessGrantRepository, ContentRepository, InvitationRepository, UserRepository,
};
use clipcast_services::{
    AccessControlService, ClipService, InvitationService, Notifier, NoopNotifier, SmtpNotifier,
    UploadCoordinator, UploadLimits,
};

use crate::state::AppState;

/// Wire up the full application: pool, gateway, repositories, services,
/// router.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, Router)> {
    let pool = database::setup_database(&config).await?;

    let gateway = clipcast_storage::create_gateway(&config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create storage gateway: {}", e))?;

    let codec = TokenCodec::new(&config.jwt_secret, config.jwt_expiry_hours);

    let users = UserRepository::new(pool.clone());
    let content = ContentRepository::new(pool.clone());
    let grants = AccessGrantRepository::new(pool.clone());
    let invitations = InvitationRepository::new(pool.clone());

    let access = Arc::new(AccessControlService::new(
        codec.clone(),
        Arc::new(users.clone()),
        Arc::new(content.clone()),
        Arc::new(grants.clone()),
    ));

    let clips = Arc::new(ClipService::new(
        Arc::new(content.clone()),
        Arc::new(grants.clone()),
    ));

    let notifier: Arc<dyn Notifier> = match SmtpNotifier::from_config(&config) {
        Some(notifier) => Arc::new(notifier),
        None => Arc::new(NoopNotifier),
    };

    let invites = Arc::new(InvitationService::new(
        access.clone(),
        Arc::new(users.clone()),
        Arc::new(content.clone()),
        Arc::new(invitations),
        notifier,
        config.invite_expiry_days,
        config.frontend_url.clone(),
    ));

    let uploads = Arc::new(UploadCoordinator::new(
        gateway.clone(),
        Arc::new(content.clone()),
        UploadLimits::from_config(&config),
    ));

    let state = Arc::new(AppState {
        config: config.clone(),
        pool,
        codec,
        gateway,
        users,
        content,
        grants,
        access,
        clips,
        invites,
        uploads,
    });

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
