// SPDX-License-Identifier: MPL-2.0
//! End-to-end navigation scenarios driven through the public session API.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use viewer_core::application::port::{
    CallbackHooks, FetchedBytes, FileInfoSource, LoadMoreFn, MediaTransport, SourceProbe,
};
use viewer_core::builtin::{self, register_builtin};
use viewer_core::error::{MediaLoadError, ValidationError};
use viewer_core::media::{BlobStore, MediaSourceResolver, SourceConfig, Viewport};
use viewer_core::{
    Error, FileId, FileRecord, Handler, HandlerRegistry, OpenOptions, SourceState, ViewerSession,
};

struct NoFolders;

#[async_trait]
impl FileInfoSource for NoFolders {
    async fn stat(&self, path: &str) -> viewer_core::Result<FileRecord> {
        Err(Error::FileInfo(format!("{path} not found")))
    }

    async fn list_folder(&self, folder: &str) -> viewer_core::Result<Vec<FileRecord>> {
        Err(Error::FileInfo(format!("{folder} not found")))
    }
}

/// Counts fetches and serves a fixed body.
#[derive(Default)]
struct CountingTransport {
    fetches: AtomicUsize,
    fail: bool,
}

#[async_trait]
impl MediaTransport for CountingTransport {
    async fn fetch(&self, _url: &str) -> Result<FetchedBytes, MediaLoadError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(MediaLoadError::Status(404));
        }
        Ok(FetchedBytes::new(Some("video/mp4".into()), vec![0, 1, 2, 3]))
    }
}

/// Counts attempts and rejects everything.
#[derive(Default)]
struct RejectingProbe {
    attempts: AtomicUsize,
}

#[async_trait]
impl SourceProbe for RejectingProbe {
    async fn try_load(&self, url: &str) -> Result<(), String> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(format!("{url} is not playable"))
    }
}

fn session_with(transport: Arc<CountingTransport>) -> ViewerSession {
    let registry = HandlerRegistry::new();
    register_builtin(&registry).expect("builtin handlers");
    let config = SourceConfig::new("https://cloud.example.com", "alice", Viewport::default())
        .expect("source config");
    ViewerSession::new(
        Arc::new(registry),
        Arc::new(NoFolders),
        MediaSourceResolver::new(config, transport, BlobStore::with_defaults()),
    )
}

fn session() -> ViewerSession {
    session_with(Arc::new(CountingTransport::default()))
}

fn abc() -> Vec<FileRecord> {
    vec![
        FileRecord::new(1, "/Photos/A.jpg", "image/jpeg"),
        FileRecord::new(2, "/Photos/B.jpg", "image/jpeg"),
        FileRecord::new(3, "/Photos/C.jpg", "image/jpeg"),
    ]
}

fn active_name(session: &ViewerSession) -> String {
    session.current().map(|file| file.basename).unwrap_or_default()
}

#[tokio::test]
async fn wraparound_from_the_middle() {
    let session = session();
    let files = abc();
    let b = files[1].clone();
    session
        .open(files, Some(b), OpenOptions::new().with_can_loop(true), None)
        .expect("open");

    session.next().await.expect("next");
    assert_eq!(active_name(&session), "C.jpg");
    session.next().await.expect("next");
    assert_eq!(active_name(&session), "A.jpg");
    session.prev().expect("prev");
    assert_eq!(active_name(&session), "C.jpg");
}

#[tokio::test]
async fn n_steps_return_to_start() {
    let session = session();
    session
        .open(abc(), None, OpenOptions::new(), None)
        .expect("open");
    for _ in 0..3 {
        session.next().await.expect("next");
    }
    assert_eq!(session.current_index(), Some(0));
}

#[tokio::test]
async fn boundary_without_loop_never_paginates_backwards() {
    let calls = Arc::new(AtomicUsize::new(0));
    let loader = {
        let calls = Arc::clone(&calls);
        LoadMoreFn::new(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(Vec::new()) })
        })
    };
    let session = session();
    session
        .open(
            abc(),
            None,
            OpenOptions::new().with_can_loop(false).with_load_more(loader),
            None,
        )
        .expect("open");

    assert_eq!(session.prev().expect("prev"), None);
    assert_eq!(session.current_index(), Some(0));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_page_is_requested_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let loader = {
        let calls = Arc::clone(&calls);
        LoadMoreFn::new(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(Vec::new()) })
        })
    };
    let session = session();
    let files = abc();
    let last = files[2].clone();
    session
        .open(
            files,
            Some(last),
            OpenOptions::new().with_can_loop(false).with_load_more(loader),
            None,
        )
        .expect("open");

    assert_eq!(session.next().await.expect("next"), None);
    assert_eq!(session.next().await.expect("next"), None);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(session.navigation_info().exhausted);
}

#[tokio::test]
async fn compare_stops_at_second_item() {
    let session = session();
    let mut files = abc();
    let b = files.remove(1);
    let a = files.remove(0);
    session.compare(a, b, None).expect("compare");

    session.next().await.expect("next");
    assert_eq!(active_name(&session), "B.jpg");
    assert_eq!(session.next().await.expect("next"), None);
    assert_eq!(active_name(&session), "B.jpg");
    assert_eq!(session.files().len(), 2);
}

#[test]
fn bad_tag_name_is_rejected_without_side_effects() {
    let registry = HandlerRegistry::new();
    let err = registry
        .register(Handler::new("bad", "Bad", "Bad_Name").with_mimes(["image/png"]))
        .unwrap_err();
    assert!(matches!(err, ValidationError::InvalidTagName { .. }));
    assert!(registry.get("bad").is_none());
    assert!(registry.is_empty());
}

#[test]
fn duplicate_registration_keeps_one_entry() {
    let registry = HandlerRegistry::new();
    registry.register(builtin::images()).expect("first");
    registry.register(builtin::images()).expect("second");
    assert_eq!(registry.len(), 1);
}

#[test]
fn find_for_only_returns_enabled_handlers() {
    let registry = HandlerRegistry::new();
    registry
        .register(
            Handler::new("never", "Never", "never-view").with_enabled(|_| false),
        )
        .expect("never");
    register_builtin(&registry).expect("builtin");

    let pdf = [FileRecord::new(9, "/doc.pdf", "application/pdf")];
    let found = registry.find_for(&pdf, None).expect("generic qualifies");
    assert!(found.is_enabled(&pdf));
    assert_eq!(found.id, builtin::GENERIC_ID);

    let jpeg = [FileRecord::new(1, "/a.jpg", "image/jpeg")];
    assert_eq!(
        registry.find_for(&jpeg, None).map(|h| h.id.clone()),
        Some(builtin::IMAGES_ID.to_string())
    );
    assert!(registry.find_for(&jpeg, Some("unknown-group")).is_none());
}

#[tokio::test]
async fn plain_file_resolves_to_remote_path_without_network() {
    let transport = Arc::new(CountingTransport::default());
    let session = session_with(Arc::clone(&transport));
    session
        .open(abc(), None, OpenOptions::new(), None)
        .expect("open");

    let first = session.resolve_active_source().await.expect("resolve");
    assert_eq!(
        first,
        SourceState::Ready(
            "https://cloud.example.com/remote.php/dav/files/alice/Photos/A.jpg".into()
        )
    );
    let second = session.resolve_active_source().await.expect("resolve");
    assert_eq!(first, second);
    assert_eq!(transport.fetches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn media_fallback_stops_after_second_failure() {
    let transport = Arc::new(CountingTransport {
        fetches: AtomicUsize::new(0),
        fail: true,
    });
    let session = session_with(Arc::clone(&transport));
    session
        .open(
            vec![FileRecord::new(5, "/Movies/clip.mp4", "video/mp4")],
            None,
            OpenOptions::new(),
            None,
        )
        .expect("open");

    let probe = RejectingProbe::default();
    let state = session.load_active_media(&probe).await.expect("load");
    assert!(matches!(
        state,
        SourceState::Failed(MediaLoadError::FallbackExhausted { .. })
    ));
    assert_eq!(probe.attempts.load(Ordering::SeqCst), 1);
    assert_eq!(transport.fetches.load(Ordering::SeqCst), 1);
    assert!(session.media_error(FileId::new(5)).is_some());
}

#[tokio::test]
async fn unplayable_stream_is_served_from_a_blob() {
    let transport = Arc::new(CountingTransport::default());
    let session = session_with(Arc::clone(&transport));
    session
        .open(
            vec![FileRecord::new(5, "/Movies/clip.mp4", "video/mp4")],
            None,
            OpenOptions::new(),
            None,
        )
        .expect("open");

    struct BlobOnly;

    #[async_trait]
    impl SourceProbe for BlobOnly {
        async fn try_load(&self, url: &str) -> Result<(), String> {
            if url.starts_with("blob:") {
                Ok(())
            } else {
                Err("direct source refused".into())
            }
        }
    }

    let SourceState::Ready(url) = session.load_active_media(&BlobOnly).await.expect("load") else {
        panic!("expected a playable source");
    };
    assert!(url.starts_with("blob:viewer/"));
    assert_eq!(session.sources().blob_stats().blob_count, 1);

    assert!(session.close());
    assert_eq!(session.sources().blob_stats().blob_count, 0);
}

#[tokio::test]
async fn every_transition_notifies_once() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let hooks = {
        let open_log = Arc::clone(&log);
        let next_log = Arc::clone(&log);
        let prev_log = Arc::clone(&log);
        let close_log = Arc::clone(&log);
        CallbackHooks::new()
            .with_open(move |file| {
                open_log.lock().unwrap().push(format!("open {}", file.basename));
                Ok(())
            })
            .with_next(move |file| {
                next_log.lock().unwrap().push(format!("next {}", file.basename));
                Ok(())
            })
            .with_prev(move |file| {
                prev_log.lock().unwrap().push(format!("prev {}", file.basename));
                Ok(())
            })
            .with_close(move || {
                close_log.lock().unwrap().push("close".to_string());
                Ok(())
            })
    };

    let session = session();
    session
        .open(abc(), None, OpenOptions::new().with_hooks(hooks), None)
        .expect("open");
    session.next().await.expect("next");
    session.prev().expect("prev");
    session.close();
    session.close();

    assert_eq!(
        *log.lock().unwrap(),
        vec!["open A.jpg", "next B.jpg", "prev A.jpg", "close"]
    );
}

#[tokio::test]
async fn failing_hook_does_not_block_navigation() {
    let hooks = CallbackHooks::new().with_next(|_| Err("router unavailable".into()));
    let session = session();
    session
        .open(abc(), None, OpenOptions::new().with_hooks(hooks), None)
        .expect("open");
    let moved = session.next().await.expect("next");
    assert_eq!(moved.map(|f| f.basename), Some("B.jpg".to_string()));
}

#[tokio::test]
async fn missing_folder_surfaces_file_info_error() {
    let session = session();
    let err = session
        .open_folder("/nowhere", None, OpenOptions::new(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::FileInfo(_)));
    assert!(!session.is_active());
}
