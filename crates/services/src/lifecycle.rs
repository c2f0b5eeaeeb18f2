//! # Ephemeral content lifecycle
//!
//! Every stream post lives for a fixed hour counted from its client-set
//! `createdAt`. Posts on screen get a one-second countdown that deletes the
//! post on the first tick it is found expired; the `Sweeper` catches the
//! rest.
//!
//! Per-item expiry and the sweep are not coordinated. Both go through
//! `delete_stream`, which treats a missing document as success.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use domains::{Clock, DocPath, DocumentStore, Result, StreamPost};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::task::TaskGuard;

/// Fixed post lifetime. Not configurable per post.
pub const POST_TTL_MS: i64 = 3_600_000;

pub fn post_ttl() -> Duration {
    Duration::milliseconds(POST_TTL_MS)
}

/// `TTL - (now - created_at)`. Negative once the post is past its lifetime.
pub fn remaining_since(created_at: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    post_ttl() - (now - created_at)
}

pub fn remaining(post: &StreamPost, now: DateTime<Utc>) -> Duration {
    remaining_since(post.created_at, now)
}

pub fn is_expired(post: &StreamPost, now: DateTime<Utc>) -> bool {
    remaining(post, now) <= Duration::zero()
}

/// "0h 12m 5s remaining", or "Expired" at or below zero.
pub fn format_remaining(remaining: Duration) -> String {
    let ms = remaining.num_milliseconds();
    if ms <= 0 {
        return "Expired".to_string();
    }
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    format!("{hours}h {minutes}m {seconds}s remaining")
}

/// What a post's timer badge shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountdownState {
    /// Tracked, first tick not run yet.
    Pending,
    Remaining(Duration),
    Expired,
}

impl CountdownState {
    pub fn label(&self) -> String {
        match self {
            CountdownState::Pending => "Loading...".to_string(),
            CountdownState::Remaining(d) => format_remaining(*d),
            CountdownState::Expired => "Expired".to_string(),
        }
    }

    pub fn is_expired(&self) -> bool {
        matches!(self, CountdownState::Expired)
    }
}

/// Deletes a stream post. A post that is already gone counts as deleted.
pub async fn delete_stream(store: &dyn DocumentStore, id: &str) -> Result<()> {
    match store.delete(&DocPath::stream(id)).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_not_found() => {
            tracing::debug!(post_id = id, "stream already deleted");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Timer settings. The TTL itself is not here on purpose: it is fixed.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    pub tick: StdDuration,
    /// Delay before the first sweep, so the store connection can settle.
    pub sweep_grace: StdDuration,
    pub sweep_interval: StdDuration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            tick: StdDuration::from_secs(1),
            sweep_grace: StdDuration::from_secs(5),
            sweep_interval: StdDuration::from_secs(60 * 60),
        }
    }
}

struct Countdown {
    state: watch::Receiver<CountdownState>,
    _task: TaskGuard,
}

#[derive(Default)]
struct Registry {
    active: HashMap<String, Countdown>,
    /// Ids whose countdown already fired. Kept until the post leaves the
    /// snapshot so a re-render never issues a second delete.
    expired: HashSet<String>,
}

/// Drives per-post countdowns for whatever is currently on screen.
pub struct LifecycleManager {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    config: LifecycleConfig,
    registry: Mutex<Registry>,
}

impl LifecycleManager {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
        config: LifecycleConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            clock,
            config,
            registry: Mutex::new(Registry::default()),
        })
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Starts a countdown for `post` unless one is running. Returns the
    /// post's countdown state.
    pub fn track(self: &Arc<Self>, post: &StreamPost) -> watch::Receiver<CountdownState> {
        let mut registry = self.registry();

        if registry.expired.contains(&post.id) {
            let (_, rx) = watch::channel(CountdownState::Expired);
            return rx;
        }
        if let Some(countdown) = registry.active.get(&post.id) {
            return countdown.state.clone();
        }

        let (tx, rx) = watch::channel(CountdownState::Pending);
        let task = TaskGuard::spawn(Arc::clone(self).run_countdown(
            post.id.clone(),
            post.created_at,
            tx,
        ));
        registry.active.insert(
            post.id.clone(),
            Countdown {
                state: rx.clone(),
                _task: task,
            },
        );
        rx
    }

    /// Stops the countdown of a post that left the screen.
    pub fn untrack(&self, id: &str) {
        if self.registry().active.remove(id).is_some() {
            tracing::trace!(post_id = id, "countdown cancelled");
        }
    }

    /// Makes the running countdowns match `visible`: starts missing ones and
    /// cancels those whose post is no longer shown.
    pub fn reconcile(self: &Arc<Self>, visible: &[StreamPost]) {
        let ids: HashSet<&str> = visible.iter().map(|p| p.id.as_str()).collect();
        self.registry().active.retain(|id, _| ids.contains(id.as_str()));
        for post in visible {
            self.track(post);
        }
    }

    /// Forgets fired countdowns of posts that are gone from `snapshot`.
    pub fn retain_expired(&self, snapshot: &[StreamPost]) {
        let ids: HashSet<&str> = snapshot.iter().map(|p| p.id.as_str()).collect();
        self.registry().expired.retain(|id| ids.contains(id.as_str()));
    }

    pub fn state(&self, id: &str) -> Option<CountdownState> {
        let registry = self.registry();
        if registry.expired.contains(id) {
            return Some(CountdownState::Expired);
        }
        registry.active.get(id).map(|c| c.state.borrow().clone())
    }

    pub fn tracked_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.registry().active.keys().cloned().collect();
        ids.sort();
        ids
    }

    async fn run_countdown(
        self: Arc<Self>,
        id: String,
        created_at: DateTime<Utc>,
        tx: watch::Sender<CountdownState>,
    ) {
        let mut ticker = tokio::time::interval(self.config.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let left = remaining_since(created_at, self.clock.now());
            if left > Duration::zero() {
                tx.send_replace(CountdownState::Remaining(left));
                continue;
            }

            tx.send_replace(CountdownState::Expired);
            self.expire(&id);
            return;
        }
    }

    /// Marks `id` expired and issues its delete. The delete runs detached and
    /// outlives the countdown task.
    fn expire(&self, id: &str) {
        self.registry().expired.insert(id.to_string());

        let store = Arc::clone(&self.store);
        let post_id = id.to_string();
        tokio::spawn(async move {
            match delete_stream(store.as_ref(), &post_id).await {
                Ok(()) => tracing::info!(post_id = %post_id, "expired stream deleted"),
                Err(e) => {
                    tracing::warn!(post_id = %post_id, error = %e, "failed to delete expired stream")
                }
            }
        });

        // Dropping the entry aborts this task; nothing awaits past here.
        let finished = self.registry().active.remove(id);
        drop(finished);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{post_created_at, stream_fields, PausedClock};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use domains::{
        AppError, Document, Fields, MockDocumentStore, Query, Snapshot, Subscription, STREAMS,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use storage_adapters::MemoryDocumentStore;

    /// Memory store whose deletes take a while to land.
    struct SlowDeleteStore {
        inner: MemoryDocumentStore,
        delay: StdDuration,
        deletes: AtomicUsize,
    }

    #[async_trait]
    impl DocumentStore for SlowDeleteStore {
        async fn subscribe(&self, query: Query) -> Result<Subscription> {
            self.inner.subscribe(query).await
        }

        async fn create(&self, collection: &str, fields: Fields) -> Result<String> {
            self.inner.create(collection, fields).await
        }

        async fn set(&self, path: &DocPath, fields: Fields, merge: bool) -> Result<()> {
            self.inner.set(path, fields, merge).await
        }

        async fn delete(&self, path: &DocPath) -> Result<()> {
            tokio::time::sleep(self.delay).await;
            self.deletes.fetch_add(1, Ordering::SeqCst);
            self.inner.delete(path).await
        }

        async fn get_once(&self, query: Query) -> Result<Snapshot> {
            self.inner.get_once(query).await
        }

        async fn get(&self, path: &DocPath) -> Result<Option<Document>> {
            self.inner.get(path).await
        }
    }

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, h, m, s).unwrap()
    }

    #[test]
    fn remaining_is_ttl_minus_elapsed() {
        let created = at(12, 0, 0);
        assert_eq!(remaining_since(created, at(12, 0, 0)), post_ttl());
        assert_eq!(remaining_since(created, at(12, 30, 0)), Duration::minutes(30));
        assert_eq!(remaining_since(created, at(13, 1, 0)), Duration::minutes(-1));
    }

    #[test]
    fn expiry_is_monotonic_in_now() {
        let post = post_created_at("p", at(12, 0, 0));
        let mut was_expired = false;
        for minute in 0..120 {
            let now = at(12, 0, 0) + Duration::minutes(minute);
            let expired = is_expired(&post, now);
            assert!(expired || !was_expired, "post came back to life at +{minute}m");
            was_expired = expired;
        }
        assert!(is_expired(&post, at(13, 0, 0)), "exactly one hour is expired");
        assert!(!is_expired(&post, at(12, 59, 59)));
    }

    #[test]
    fn formats_remaining_time() {
        assert_eq!(
            format_remaining(Duration::seconds(3599)),
            "0h 59m 59s remaining"
        );
        assert_eq!(format_remaining(post_ttl()), "1h 0m 0s remaining");
        assert_eq!(format_remaining(Duration::zero()), "Expired");
        assert_eq!(format_remaining(Duration::seconds(-5)), "Expired");
    }

    #[tokio::test]
    async fn delete_of_missing_document_is_success() {
        let mut store = MockDocumentStore::new();
        store
            .expect_delete()
            .times(2)
            .returning(|path| Err(AppError::NotFound("stream".into(), path.id.clone())));
        delete_stream(&store, "gone").await.unwrap();
        delete_stream(&store, "gone").await.unwrap();
    }

    #[tokio::test]
    async fn other_delete_errors_propagate() {
        let mut store = MockDocumentStore::new();
        store
            .expect_delete()
            .returning(|_| Err(AppError::PermissionDenied("rules".into())));
        assert!(delete_stream(&store, "p").await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_deletes_exactly_once_on_expiry() {
        let deletes = Arc::new(AtomicUsize::new(0));
        let mut store = MockDocumentStore::new();
        let counter = deletes.clone();
        store.expect_delete().returning(move |path| {
            assert_eq!(path.id, "p1");
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let clock = Arc::new(PausedClock::start_at(at(12, 59, 57)));
        let manager = LifecycleManager::new(
            Arc::new(store),
            clock,
            LifecycleConfig::default(),
        );
        let post = post_created_at("p1", at(12, 0, 0));

        let mut state = manager.track(&post);
        state.changed().await.unwrap();
        assert!(matches!(*state.borrow(), CountdownState::Remaining(_)));

        tokio::time::sleep(StdDuration::from_secs(10)).await;

        assert!(state.borrow().is_expired());
        assert_eq!(deletes.load(Ordering::SeqCst), 1);
        assert!(manager.tracked_ids().is_empty());

        // Re-rendering the same (not yet removed) post must not delete again.
        manager.reconcile(std::slice::from_ref(&post));
        tokio::time::sleep(StdDuration::from_secs(5)).await;
        assert_eq!(deletes.load(Ordering::SeqCst), 1);
        assert_eq!(manager.state("p1"), Some(CountdownState::Expired));
    }

    #[tokio::test(start_paused = true)]
    async fn reconcile_cancels_countdowns_that_left_the_screen() {
        let mut store = MockDocumentStore::new();
        store.expect_delete().never();

        let clock = Arc::new(PausedClock::start_at(at(12, 10, 0)));
        let manager = LifecycleManager::new(Arc::new(store), clock, LifecycleConfig::default());
        let a = post_created_at("a", at(12, 0, 0));
        let b = post_created_at("b", at(12, 5, 0));

        manager.reconcile(&[a.clone(), b.clone()]);
        assert_eq!(manager.tracked_ids(), vec!["a".to_string(), "b".to_string()]);

        manager.reconcile(std::slice::from_ref(&b));
        assert_eq!(manager.tracked_ids(), vec!["b".to_string()]);

        manager.untrack("b");
        assert!(manager.tracked_ids().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn track_returns_the_running_countdown() {
        let store = MockDocumentStore::new();
        let clock = Arc::new(PausedClock::start_at(at(12, 0, 30)));
        let manager = LifecycleManager::new(Arc::new(store), clock, LifecycleConfig::default());
        let post = post_created_at("p", at(12, 0, 0));

        let mut first = manager.track(&post);
        let _second = manager.track(&post);
        assert_eq!(manager.tracked_ids().len(), 1);

        first.changed().await.unwrap();
        assert_eq!(
            first.borrow().label(),
            "0h 59m 30s remaining"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn hiding_a_post_does_not_cancel_its_expiry_delete() {
        let store = Arc::new(SlowDeleteStore {
            inner: MemoryDocumentStore::new(),
            delay: StdDuration::from_millis(200),
            deletes: AtomicUsize::new(0),
        });
        let id = store
            .create(STREAMS, stream_fields(at(12, 0, 0)))
            .await
            .unwrap();
        let post = post_created_at(&id, at(12, 0, 0));

        let clock = Arc::new(PausedClock::start_at(at(13, 5, 0)));
        let manager = LifecycleManager::new(store.clone(), clock, LifecycleConfig::default());

        let mut state = manager.track(&post);
        state.changed().await.unwrap();
        assert!(state.borrow().is_expired());

        // The post leaves the screen while its delete is still in flight,
        // then comes back.
        manager.reconcile(&[]);
        manager.reconcile(std::slice::from_ref(&post));
        assert_eq!(manager.state(&id), Some(CountdownState::Expired));

        tokio::time::sleep(StdDuration::from_secs(5)).await;
        assert_eq!(store.deletes.load(Ordering::SeqCst), 1);
        assert!(store.inner.get(&DocPath::stream(&id)).await.unwrap().is_none());
    }
}
