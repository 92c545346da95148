//! Access-control service tests: grant idempotence, role-scoped visibility,
//! and race-safe download counting.

mod helpers;

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use clipcast_core::auth::{Capability, TokenCodec};
use clipcast_core::models::{Content, ContentKind, ContentStatus, GrantState, Role};
use clipcast_core::repo::GrantStore;
use clipcast_core::AppError;
use clipcast_services::access::AccessControlService;
use clipcast_services::DownloadTracking;
use helpers::{test_user, MemoryContentStore, MemoryGrantStore, MemoryUserStore};

const SECRET: &str = "test-secret-key-min-32-characters-long";

struct Harness {
    users: Arc<MemoryUserStore>,
    content: Arc<MemoryContentStore>,
    grants: Arc<MemoryGrantStore>,
    service: Arc<AccessControlService>,
    codec: TokenCodec,
}

fn harness() -> Harness {
    let users = Arc::new(MemoryUserStore::default());
    let content = Arc::new(MemoryContentStore::default());
    let grants = Arc::new(MemoryGrantStore::default());
    let codec = TokenCodec::new(SECRET, 24);
    let service = Arc::new(AccessControlService::new(
        codec.clone(),
        users.clone(),
        content.clone(),
        grants.clone(),
    ));
    Harness {
        users,
        content,
        grants,
        service,
        codec,
    }
}

fn podcast(studio_id: Uuid) -> Content {
    let now = Utc::now();
    Content {
        id: Uuid::new_v4(),
        kind: ContentKind::Podcast,
        title: "Episode".to_string(),
        description: None,
        studio_id,
        agency_id: None,
        filename: "episode.mp4".to_string(),
        original_name: None,
        content_type: "video/mp4".to_string(),
        size_bytes: 1024,
        duration_secs: Some(3600.0),
        storage_key: format!("media/{}.mp4", Uuid::new_v4()),
        parent_id: None,
        start_secs: None,
        end_secs: None,
        status: ContentStatus::Processed,
        created_at: now,
        updated_at: now,
    }
}

fn clip_of(parent: &Content, agency_id: Uuid) -> Content {
    let now = Utc::now();
    Content {
        id: Uuid::new_v4(),
        kind: ContentKind::Clip,
        title: "Clip".to_string(),
        description: None,
        studio_id: parent.studio_id,
        agency_id: Some(agency_id),
        filename: "clip.mp4".to_string(),
        original_name: None,
        content_type: "video/mp4".to_string(),
        size_bytes: 128,
        duration_secs: Some(30.0),
        storage_key: format!("clips/{}.mp4", Uuid::new_v4()),
        parent_id: Some(parent.id),
        start_secs: Some(10.0),
        end_secs: Some(40.0),
        status: ContentStatus::Processed,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn authorize_checks_signature_and_capability() {
    let h = harness();
    let studio = test_user("studio@example.com", Role::Studio);
    let token = h
        .codec
        .issue(studio.id, &studio.email, studio.role)
        .unwrap();

    let identity = h.service.authorize(&token, Capability::UploadContent).unwrap();
    assert_eq!(identity.user_id, studio.id);

    // A studio token cannot exercise an editor capability.
    assert!(matches!(
        h.service.authorize(&token, Capability::DownloadClips),
        Err(AppError::InsufficientPermission(_))
    ));

    assert!(matches!(
        h.service.authorize("garbage", Capability::UploadContent),
        Err(AppError::InvalidCredential(_))
    ));
}

/// Granting twice for the same (content, grantee) pair yields exactly one
/// active grant; the second call reactivates instead of duplicating, and the
/// download counter survives revocation.
#[tokio::test]
async fn grant_access_is_idempotent_and_preserves_counter() {
    let h = harness();
    let studio = h.users.add(test_user("studio@example.com", Role::Studio));
    let agency = h.users.add(test_user("agency@example.com", Role::Agency));
    let content = h.content.add(podcast(studio.id));

    let first = h
        .service
        .grant_access(studio.id, content.id, agency.id)
        .await
        .unwrap();
    let second = h
        .service
        .grant_access(studio.id, content.id, agency.id)
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(h.grants.all().len(), 1);

    // Count a download, revoke, re-grant: the historical counter remains.
    h.grants.record_download(first.id).await.unwrap();
    h.service
        .revoke_access(studio.id, content.id, agency.id)
        .await
        .unwrap();
    assert_eq!(h.grants.all()[0].state, GrantState::Revoked);

    let regranted = h
        .service
        .grant_access(studio.id, content.id, agency.id)
        .await
        .unwrap();
    assert_eq!(regranted.state, GrantState::Active);
    assert_eq!(regranted.download_count, 1);
    assert_eq!(h.grants.all().len(), 1);
}

#[tokio::test]
async fn agency_cannot_regrant_parent_podcast_but_can_share_own_clip() {
    let h = harness();
    let studio = h.users.add(test_user("studio@example.com", Role::Studio));
    let agency = h.users.add(test_user("agency@example.com", Role::Agency));
    let editor = h.users.add(test_user("editor@example.com", Role::Editor));
    let parent = h.content.add(podcast(studio.id));
    let clip = h.content.add(clip_of(&parent, agency.id));

    // The parent podcast is not delegable by the agency.
    assert!(matches!(
        h.service.grant_access(agency.id, parent.id, editor.id).await,
        Err(AppError::NotFound(_))
    ));

    // Its own clip is.
    let grant = h
        .service
        .grant_access(agency.id, clip.id, editor.id)
        .await
        .unwrap();
    assert_eq!(grant.content_id, clip.id);
    assert_eq!(grant.grantee_id, editor.id);
}

/// Scenario: agency A has no grant on podcast P; its listing excludes P;
/// after the studio grants access the listing includes P.
#[tokio::test]
async fn visibility_follows_grants_for_agencies() {
    let h = harness();
    let studio = h.users.add(test_user("studio@example.com", Role::Studio));
    let agency = h.users.add(test_user("agency@example.com", Role::Agency));
    let content = h.content.add(podcast(studio.id));

    let before = h
        .service
        .list_visible_content(agency.id, Role::Agency)
        .await
        .unwrap();
    assert!(before.is_empty());

    h.service
        .grant_access(studio.id, content.id, agency.id)
        .await
        .unwrap();

    let after = h
        .service
        .list_visible_content(agency.id, Role::Agency)
        .await
        .unwrap();
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].id, content.id);
}

#[tokio::test]
async fn role_branches_stay_distinct() {
    let h = harness();
    let studio = h.users.add(test_user("studio@example.com", Role::Studio));
    let other_studio = h.users.add(test_user("other@example.com", Role::Studio));
    let agency = h.users.add(test_user("agency@example.com", Role::Agency));
    let editor = h.users.add(test_user("editor@example.com", Role::Editor));

    let owned = h.content.add(podcast(studio.id));
    let foreign = h.content.add(podcast(other_studio.id));
    let clip = h.content.add(clip_of(&owned, agency.id));

    // Studio sees what it owns (podcast + clip cut from it), nothing granted.
    let studio_view = h
        .service
        .list_visible_content(studio.id, Role::Studio)
        .await
        .unwrap();
    let studio_ids: Vec<Uuid> = studio_view.iter().map(|c| c.id).collect();
    assert!(studio_ids.contains(&owned.id));
    assert!(studio_ids.contains(&clip.id));
    assert!(!studio_ids.contains(&foreign.id));

    // Agency sees clips it created even without a grant on them.
    let agency_view = h
        .service
        .list_visible_content(agency.id, Role::Agency)
        .await
        .unwrap();
    assert_eq!(agency_view.len(), 1);
    assert_eq!(agency_view[0].id, clip.id);

    // Editor sees only granted content.
    let empty = h
        .service
        .list_visible_content(editor.id, Role::Editor)
        .await
        .unwrap();
    assert!(empty.is_empty());

    h.service
        .grant_access(agency.id, clip.id, editor.id)
        .await
        .unwrap();
    let editor_view = h
        .service
        .list_visible_content(editor.id, Role::Editor)
        .await
        .unwrap();
    assert_eq!(editor_view.len(), 1);
    assert_eq!(editor_view[0].id, clip.id);
}

/// Scenario: an editor's first download moves the counter 0 -> 1; a second,
/// concurrent download moves it to 2 with no lost increment.
#[tokio::test]
async fn concurrent_downloads_each_count() {
    let h = harness();
    let studio = h.users.add(test_user("studio@example.com", Role::Studio));
    let agency = h.users.add(test_user("agency@example.com", Role::Agency));
    let editor = h.users.add(test_user("editor@example.com", Role::Editor));
    let parent = h.content.add(podcast(studio.id));
    let clip = h.content.add(clip_of(&parent, agency.id));

    h.service
        .grant_access(agency.id, clip.id, editor.id)
        .await
        .unwrap();

    let a = {
        let service = h.service.clone();
        let clip_id = clip.id;
        let editor_id = editor.id;
        tokio::spawn(async move { service.track_download(editor_id, Role::Editor, clip_id).await })
    };
    let b = {
        let service = h.service.clone();
        let clip_id = clip.id;
        let editor_id = editor.id;
        tokio::spawn(async move { service.track_download(editor_id, Role::Editor, clip_id).await })
    };

    let mut counts = vec![];
    for result in [a.await.unwrap().unwrap(), b.await.unwrap().unwrap()] {
        match result {
            DownloadTracking::Counted { download_count } => counts.push(download_count),
            DownloadTracking::OwnerDownload => panic!("editor download must be counted"),
        }
    }
    counts.sort_unstable();
    assert_eq!(counts, vec![1, 2]);

    // Owners download without touching the counter.
    let owner = h
        .service
        .track_download(agency.id, Role::Agency, clip.id)
        .await
        .unwrap();
    assert_eq!(owner, DownloadTracking::OwnerDownload);
    assert_eq!(h.grants.all()[0].download_count, 2);
}

#[tokio::test]
async fn editor_without_grant_cannot_download() {
    let h = harness();
    let studio = h.users.add(test_user("studio@example.com", Role::Studio));
    let agency = h.users.add(test_user("agency@example.com", Role::Agency));
    let editor = h.users.add(test_user("editor@example.com", Role::Editor));
    let parent = h.content.add(podcast(studio.id));
    let clip = h.content.add(clip_of(&parent, agency.id));

    assert!(matches!(
        h.service.track_download(editor.id, Role::Editor, clip.id).await,
        Err(AppError::InsufficientPermission(_))
    ));
}
