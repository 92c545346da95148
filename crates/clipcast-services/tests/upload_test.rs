//! Upload coordinator integration tests against the in-memory gateway.

mod helpers;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use clipcast_core::models::{ContentStatus, PartReceipt};
use clipcast_core::AppError;
use clipcast_services::upload::{UploadCoordinator, UploadLimits, UploadMetadata};
use helpers::{MemoryContentStore, MemoryGateway};

const MIB: u64 = 1024 * 1024;

fn limits() -> UploadLimits {
    UploadLimits {
        max_size_bytes: 100 * 1024 * MIB,
        part_size_bytes: 5 * MIB,
        part_url_ttl: Duration::from_secs(3600),
        read_url_ttl: Duration::from_secs(86400),
    }
}

fn coordinator() -> (Arc<MemoryGateway>, Arc<MemoryContentStore>, UploadCoordinator) {
    let gateway = Arc::new(MemoryGateway::default());
    let content = Arc::new(MemoryContentStore::default());
    let coordinator = UploadCoordinator::new(gateway.clone(), content.clone(), limits());
    (gateway, content, coordinator)
}

fn metadata() -> UploadMetadata {
    UploadMetadata {
        title: "Episode 12".to_string(),
        description: None,
        original_name: Some("episode-12.mp4".to_string()),
        duration_secs: Some(3600.0),
        studio_id: uuid::Uuid::new_v4(),
    }
}

#[tokio::test]
async fn open_session_computes_part_layout_and_authorizations() {
    let (_gateway, _content, coordinator) = coordinator();

    let opened = coordinator
        .open_session("episode-12.mp4", "video/mp4", 12 * MIB)
        .await
        .unwrap();

    assert_eq!(opened.session.part_count(), 3);
    assert_eq!(opened.part_authorizations.len(), 3);
    let numbers: Vec<i32> = opened
        .part_authorizations
        .iter()
        .map(|a| a.part_number)
        .collect();
    assert_eq!(numbers, vec![1, 2, 3]);
}

#[tokio::test]
async fn open_session_rejects_zero_and_oversized_and_unsupported() {
    let (_gateway, _content, coordinator) = coordinator();

    assert!(matches!(
        coordinator.open_session("a.mp4", "video/mp4", 0).await,
        Err(AppError::InvalidInput(_))
    ));
    assert!(matches!(
        coordinator
            .open_session("a.mp4", "video/mp4", 101 * 1024 * MIB)
            .await,
        Err(AppError::PayloadTooLarge(_))
    ));
    assert!(matches!(
        coordinator
            .open_session("a.tar", "application/x-tar", MIB)
            .await,
        Err(AppError::InvalidInput(_))
    ));
}

/// Scenario: a 12 MiB file with 5 MiB parts splits into 3 parts; completing
/// with parts 1 and 3 fails without a backend call, and succeeds once part 2
/// lands.
#[tokio::test]
async fn completion_requires_every_part() {
    let (gateway, content, coordinator) = coordinator();

    let opened = coordinator
        .open_session("episode-12.mp4", "video/mp4", 12 * MIB)
        .await
        .unwrap();
    let mut session = opened.session;

    coordinator
        .upload_part(&mut session, 1, Bytes::from(vec![1u8; (5 * MIB) as usize]))
        .await
        .unwrap();
    coordinator
        .upload_part(&mut session, 3, Bytes::from(vec![3u8; (2 * MIB) as usize]))
        .await
        .unwrap();
    assert_eq!(session.missing_parts(), vec![2]);

    let err = coordinator
        .complete_session(&session, session.receipts(), metadata())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::IncompleteUpload(_)));
    // The gap was detected locally; the backend never saw the call.
    assert_eq!(gateway.complete_calls.load(Ordering::SeqCst), 0);
    assert_eq!(content.len(), 0);

    coordinator
        .upload_part(&mut session, 2, Bytes::from(vec![2u8; (5 * MIB) as usize]))
        .await
        .unwrap();
    assert!(session.is_complete());

    let (created, playback_url) = coordinator
        .complete_session(&session, session.receipts(), metadata())
        .await
        .unwrap();

    assert_eq!(gateway.complete_calls.load(Ordering::SeqCst), 1);
    assert_eq!(created.size_bytes, (12 * MIB) as i64);
    assert_eq!(created.status, ContentStatus::Processed);
    assert!(playback_url.contains(&created.storage_key));
    assert_eq!(
        gateway.object(&created.storage_key).map(|o| o.len()),
        Some((12 * MIB) as usize)
    );
}

#[tokio::test]
async fn failed_backend_completion_creates_no_content_record() {
    let (gateway, content, coordinator) = coordinator();

    let opened = coordinator
        .open_session("a.mp4", "video/mp4", 6 * MIB)
        .await
        .unwrap();
    let mut session = opened.session;

    coordinator
        .upload_part(&mut session, 1, Bytes::from(vec![0u8; (5 * MIB) as usize]))
        .await
        .unwrap();
    coordinator
        .upload_part(&mut session, 2, Bytes::from(vec![0u8; MIB as usize]))
        .await
        .unwrap();

    // Full coverage but forged tags: passes local validation, fails at the
    // backend.
    let forged: Vec<PartReceipt> = (1..=2)
        .map(|part_number| PartReceipt {
            part_number,
            receipt_tag: "forged".to_string(),
        })
        .collect();

    let err = coordinator
        .complete_session(&session, forged, metadata())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BackendUnavailable(_)));
    assert_eq!(gateway.complete_calls.load(Ordering::SeqCst), 1);
    assert_eq!(content.len(), 0);
}

#[tokio::test]
async fn retried_part_does_not_double_count_progress() {
    let (_gateway, _content, coordinator) = coordinator();

    let opened = coordinator
        .open_session("a.mp4", "video/mp4", 10 * MIB)
        .await
        .unwrap();
    let mut session = opened.session;

    coordinator
        .upload_part(&mut session, 1, Bytes::from(vec![0u8; (5 * MIB) as usize]))
        .await
        .unwrap();
    let progress_after_first = session.progress();

    coordinator
        .upload_part(&mut session, 1, Bytes::from(vec![9u8; (5 * MIB) as usize]))
        .await
        .unwrap();
    assert_eq!(session.progress(), progress_after_first);
    assert_eq!(session.bytes_sent(), 5 * MIB);
}

#[tokio::test]
async fn abort_discards_session_and_never_raises() {
    let (gateway, _content, coordinator) = coordinator();

    let opened = coordinator
        .open_session("a.mp4", "video/mp4", MIB)
        .await
        .unwrap();
    let session = opened.session;
    assert!(gateway.session_open(&session.session_id));

    coordinator.abort_session(&session).await;
    assert!(!gateway.session_open(&session.session_id));

    // Abort after abort is still safe.
    coordinator.abort_session(&session).await;
    assert_eq!(gateway.abort_calls.load(Ordering::SeqCst), 2);
}
