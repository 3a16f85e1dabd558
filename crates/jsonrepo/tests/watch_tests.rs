//! Integration tests for polling and hot reload.

#![cfg(feature = "watch")]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use jsonrepo::repository::{InMemoryRepository, JsonRepository, RepositoryError, RepositoryResult};
use jsonrepo::watch::{ReloadEvent, ReloadTrigger};
use jsonrepo::{JsonRepositoryProvider, RepositorySource, WatchError};

const TICK: Duration = Duration::from_millis(10);

// ============================================================================
// Helpers
// ============================================================================

/// In-memory repository that counts fetches.
#[derive(Default)]
struct CountingRepository {
    documents: InMemoryRepository,
    fetches: AtomicUsize,
}

impl CountingRepository {
    fn with(key: &str, document: &str) -> Arc<Self> {
        let repo = Self::default();
        repo.documents.set(key, document);
        Arc::new(repo)
    }

    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl JsonRepository for CountingRepository {
    fn get_by_key(&self, key: &str) -> RepositoryResult {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.documents.get_by_key(key)
    }
}

fn watched(repo: Arc<CountingRepository>) -> Arc<JsonRepositoryProvider> {
    Arc::new(JsonRepositoryProvider::new(
        RepositorySource::new("app")
            .repository(repo)
            .reload_on_change(true)
            .change_check_interval(TICK),
    ))
}

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

// ============================================================================
// Change Detection
// ============================================================================

#[test]
fn test_identical_content_never_reloads() {
    let repo = CountingRepository::with("app", r#"{"Port": 8080}"#);
    let changes = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&changes);

    let handle = watched(Arc::clone(&repo))
        .watch()
        .on_change(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        })
        .start()
        .unwrap();

    // Let the poller run many ticks over unchanged content.
    assert!(wait_until(Duration::from_secs(5), || repo.fetches() > 10));

    assert_eq!(handle.epoch(), 1);
    assert_eq!(handle.generation(), 0);
    assert_eq!(changes.load(Ordering::SeqCst), 0);
}

#[test]
fn test_one_byte_change_reloads_once() {
    let repo = CountingRepository::with("app", r#"{"Port": 8080}"#);
    let events = Arc::new(Mutex::new(Vec::<ReloadEvent>::new()));
    let sink = Arc::clone(&events);

    let handle = watched(Arc::clone(&repo))
        .watch()
        .on_change(move |event| sink.lock().unwrap().push(event))
        .start()
        .unwrap();
    assert_eq!(handle.get().value("port"), Some("8080"));

    repo.documents.set("app", r#"{"Port": 8081}"#);

    assert!(wait_until(Duration::from_secs(5), || handle.epoch() == 2));
    assert_eq!(handle.get().value("port"), Some("8081"));

    // Several more ticks over the new content must not reload again.
    let fetches = repo.fetches();
    assert!(wait_until(Duration::from_secs(5), || repo.fetches() > fetches + 5));
    assert_eq!(handle.epoch(), 2);
    assert_eq!(handle.generation(), 1);

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].key, "app");
    assert_eq!(events[0].trigger, ReloadTrigger::ContentChanged { generation: 1 });
    assert_eq!(events[0].entries, 1);
}

#[test]
fn test_deleted_document_publishes_empty_mapping() {
    let repo = CountingRepository::with("app", r#"{"Port": 8080}"#);
    let handle = watched(Arc::clone(&repo)).watch().start().unwrap();

    repo.documents.remove("app");

    assert!(wait_until(Duration::from_secs(5), || handle.get().is_empty()));
    assert!(handle.is_running());
}

#[test]
fn test_changes_during_slow_reload_coalesce() {
    const CHANGES: u64 = 20;

    let repo = CountingRepository::with("app", r#"{"V": "0"}"#);
    let calls = Arc::new(AtomicUsize::new(0));
    let held = Arc::new(AtomicBool::new(true));
    let (seen, gate) = (Arc::clone(&calls), Arc::clone(&held));

    let handle = watched(Arc::clone(&repo))
        .watch()
        .on_change(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            while gate.load(Ordering::SeqCst) {
                thread::sleep(TICK);
            }
        })
        .start()
        .unwrap();

    // Every write is detected while the first reload is still in its callback.
    for n in 1..=CHANGES {
        repo.documents.set("app", format!(r#"{{"V": "{n}"}}"#));
        assert!(wait_until(Duration::from_secs(5), || handle.generation() == n));
    }
    held.store(false, Ordering::SeqCst);

    assert!(wait_until(Duration::from_secs(5), || {
        handle.get().value("v") == Some("20")
    }));
    thread::sleep(TICK * 10);

    let calls = calls.load(Ordering::SeqCst);
    assert!((1..=2).contains(&calls), "{calls} reloads for {CHANGES} changes");
    assert_eq!(handle.epoch(), 1 + calls as u64);
    assert_eq!(handle.generation(), CHANGES);
}

// ============================================================================
// Error Resilience
// ============================================================================

#[test]
fn test_always_failing_repository_never_crashes() {
    let fetches = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fetches);
    let failing = move |key: &str| -> RepositoryResult {
        counter.fetch_add(1, Ordering::SeqCst);
        Err(RepositoryError::unavailable(key, "connection refused"))
    };

    let provider = Arc::new(JsonRepositoryProvider::new(
        RepositorySource::new("app")
            .repository(Arc::new(failing))
            .optional(true)
            .reload_on_change(true)
            .change_check_interval(TICK),
    ));
    let handle = provider.watch().start().unwrap();

    assert!(wait_until(Duration::from_secs(5), || {
        fetches.load(Ordering::SeqCst) > 10
    }));
    assert!(handle.is_running());
    assert!(handle.get().is_empty());
    assert_eq!(handle.generation(), 0);
}

#[test]
fn test_invalid_reload_keeps_previous_and_reports() {
    let repo = CountingRepository::with("app", r#"{"Port": 8080}"#);
    let errors = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&errors);

    let handle = watched(Arc::clone(&repo))
        .watch()
        .on_error(move |err| {
            assert!(matches!(err, WatchError::ReloadFailed { .. }));
            seen.fetch_add(1, Ordering::SeqCst);
        })
        .start()
        .unwrap();

    repo.documents.set("app", r#"{"Port": 8080, "PORT": 9090}"#);

    assert!(wait_until(Duration::from_secs(5), || {
        errors.load(Ordering::SeqCst) == 1
    }));
    assert_eq!(handle.epoch(), 1);
    assert_eq!(handle.get().value("Port"), Some("8080"));
    assert!(handle.is_running());

    // A later valid document is picked up again.
    repo.documents.set("app", r#"{"Port": 9090}"#);
    assert!(wait_until(Duration::from_secs(5), || {
        handle.get().value("Port") == Some("9090")
    }));
}

#[test]
fn test_hook_can_ignore_reload_errors() {
    let repo = CountingRepository::with("app", r#"{"a": 1}"#);
    let ignored = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&ignored);
    let errors = Arc::new(AtomicUsize::new(0));
    let reported = Arc::clone(&errors);

    let provider = Arc::new(JsonRepositoryProvider::new(
        RepositorySource::new("app")
            .repository(Arc::clone(&repo) as Arc<dyn JsonRepository>)
            .reload_on_change(true)
            .change_check_interval(TICK)
            .on_load_error(move |ctx| {
                if ctx.is_reload() {
                    seen.fetch_add(1, Ordering::SeqCst);
                    ctx.ignore();
                }
            }),
    ));
    let handle = provider
        .watch()
        .on_error(move |_| {
            reported.fetch_add(1, Ordering::SeqCst);
        })
        .start()
        .unwrap();

    repo.documents.set("app", "[]");

    assert!(wait_until(Duration::from_secs(5), || {
        ignored.load(Ordering::SeqCst) == 1
    }));
    assert_eq!(errors.load(Ordering::SeqCst), 0);
    assert_eq!(handle.get().value("a"), Some("1"));
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_stop_returns_promptly_and_stops_fetching() {
    let repo = CountingRepository::with("app", "{}");
    let provider = Arc::new(JsonRepositoryProvider::new(
        RepositorySource::new("app")
            .repository(Arc::clone(&repo) as Arc<dyn JsonRepository>)
            .reload_on_change(true)
            .change_check_interval(Duration::from_secs(3600)),
    ));
    let handle = provider.watch().start().unwrap();
    let fetches = repo.fetches();

    let started = Instant::now();
    handle.stop();
    drop(handle);
    assert!(started.elapsed() < Duration::from_secs(1));

    thread::sleep(Duration::from_millis(50));
    assert_eq!(repo.fetches(), fetches);
}

#[test]
fn test_no_fetch_after_stop() {
    let repo = CountingRepository::with("app", "{}");
    let handle = watched(Arc::clone(&repo)).watch().start().unwrap();

    assert!(wait_until(Duration::from_secs(5), || repo.fetches() > 3));
    handle.stop();

    // Allow an in-flight tick to finish.
    thread::sleep(Duration::from_millis(50));
    let after_stop = repo.fetches();
    thread::sleep(Duration::from_millis(100));

    assert_eq!(repo.fetches(), after_stop);
    assert!(matches!(handle.reload(), Err(WatchError::Stopped)));
}

#[test]
fn test_manual_reload() {
    let repo = CountingRepository::with("app", r#"{"v": 1}"#);
    let manual = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&manual);

    let provider = Arc::new(JsonRepositoryProvider::new(
        RepositorySource::new("app")
            .repository(Arc::clone(&repo) as Arc<dyn JsonRepository>)
            .reload_on_change(true)
            .change_check_interval(Duration::from_secs(3600)),
    ));
    let handle = provider
        .watch()
        .on_change(move |event| {
            if event.is_manual() {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        })
        .start()
        .unwrap();

    repo.documents.set("app", r#"{"v": 2}"#);
    handle.reload().unwrap();

    assert!(wait_until(Duration::from_secs(5), || {
        manual.load(Ordering::SeqCst) == 1
    }));
    assert_eq!(handle.get().value("v"), Some("2"));
    assert!(handle.has_changed_since(1));
}

#[test]
fn test_disabled_watch_never_polls() {
    let repo = CountingRepository::with("app", r#"{"a": 1}"#);
    let provider = Arc::new(JsonRepositoryProvider::new(
        RepositorySource::new("app")
            .repository(Arc::clone(&repo) as Arc<dyn JsonRepository>)
            .change_check_interval(TICK),
    ));

    let handle = provider.watch().start().unwrap();
    thread::sleep(Duration::from_millis(100));

    assert!(!handle.is_running());
    assert_eq!(repo.fetches(), 1);
    assert!(matches!(handle.reload(), Err(WatchError::Stopped)));
    assert_eq!(handle.get().value("A"), Some("1"));
}

#[test]
fn test_handles_share_one_watch() {
    let repo = CountingRepository::with("app", r#"{"a": 1}"#);
    let handle = watched(Arc::clone(&repo)).watch().start().unwrap();
    let clone = handle.clone();

    drop(handle);
    assert!(clone.is_running());

    repo.documents.set("app", r#"{"a": 2}"#);
    assert!(wait_until(Duration::from_secs(5), || {
        clone.get().value("a") == Some("2")
    }));
}
