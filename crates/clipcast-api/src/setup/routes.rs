//! Route configuration and setup.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

use clipcast_core::Config;

use crate::api_doc::ApiDoc;
use crate::handlers::{auth, clips, invites, podcasts, uploads};
use crate::state::AppState;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(config)?;

    // Relayed parts arrive as raw bodies of one part size; leave headroom.
    let body_limit = (config.upload_part_size_bytes as usize) + 1024 * 1024;

    let api = Router::new()
        // Auth
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        // Uploads
        .route("/api/uploads/open", post(uploads::open_upload))
        .route(
            "/api/uploads/{session_id}/parts/{part_number}",
            put(uploads::relay_part),
        )
        .route("/api/uploads/complete", post(uploads::complete_upload))
        .route("/api/uploads/abort", post(uploads::abort_upload))
        // Podcasts
        .route("/api/podcasts", get(podcasts::list_podcasts))
        .route("/api/podcasts/{id}", get(podcasts::get_podcast))
        .route("/api/podcasts/{id}", put(podcasts::update_podcast))
        .route("/api/podcasts/{id}", delete(podcasts::delete_podcast))
        .route(
            "/api/podcasts/{id}/playback",
            post(podcasts::playback_podcast),
        )
        // Clips
        .route("/api/clips", post(clips::create_clip))
        .route("/api/clips", get(clips::list_clips))
        .route("/api/clips/{id}/access", post(clips::grant_clip_access))
        .route("/api/clips/{id}/download", post(clips::download_clip))
        .route("/api/clips/{id}/status", put(clips::update_clip_status))
        // Invitations
        .route("/api/invites/send", post(invites::send_invite))
        .route("/api/invites/validate", post(invites::validate_invite))
        .route("/api/invites/accept", post(invites::accept_invite))
        // Health
        .route("/health", get(health))
        .with_state(state);

    let router = api
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(router)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = match config.frontend_url.as_deref() {
        Some(frontend) => {
            let origin: HeaderValue = frontend
                .parse()
                .map_err(|_| anyhow::anyhow!("FRONTEND_URL is not a valid origin"))?;
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods(Any)
                .allow_headers(Any)
        }
        None if config.is_production() => {
            return Err(anyhow::anyhow!(
                "FRONTEND_URL must be set in production (CORS origin)"
            ));
        }
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };
    Ok(cors)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
