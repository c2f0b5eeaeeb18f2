//! # UltragolClient
//!
//! The explicit application state of one client session: live feed, filter
//! state, favorites, countdowns and session, wired together. Every user
//! action re-derives the visible list from the cached snapshot.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use domains::{
    Clock, Comment, DocumentStore, IdentityProvider, LocalStorage, Result, StreamPost,
    Subscription,
};
use tokio::sync::{broadcast, watch};

use crate::comments::{add_comment, decode_comments, delete_own_comment, subscribe_comments};
use crate::debounce::{Debouncer, SEARCH_DEBOUNCE};
use crate::favorites::Favorites;
use crate::feed::{LiveFeed, PostList};
use crate::filter::{apply_filters, ClientFilterState, PlatformFilter};
use crate::lifecycle::{CountdownState, LifecycleConfig, LifecycleManager};
use crate::notify::{Notice, Notifier};
use crate::ratings::{rate, subscribe_ratings, summarize, RatingSummary};
use crate::session::Session;
use crate::streams::{delete_own_post, publish, StreamSubmission};
use crate::task::TaskGuard;

/// Adapters a client runs against.
pub struct ClientDeps {
    pub store: Arc<dyn DocumentStore>,
    pub storage: Arc<dyn LocalStorage>,
    pub identity: Arc<dyn IdentityProvider>,
    pub clock: Arc<dyn Clock>,
    pub lifecycle: LifecycleConfig,
}

pub struct UltragolClient {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    session: Session,
    notifier: Notifier,
    lifecycle: Arc<LifecycleManager>,
    feed: LiveFeed,
    state: Mutex<ClientFilterState>,
    /// Serializes derive-and-publish so the view never moves back to an
    /// older snapshot.
    refresh_lock: Mutex<()>,
    favorites: tokio::sync::Mutex<Favorites>,
    view: watch::Sender<PostList>,
    search: Debouncer<String>,
    _refresher: TaskGuard,
}

impl UltragolClient {
    pub async fn start(deps: ClientDeps) -> Result<Arc<Self>> {
        let notifier = Notifier::default();
        let favorites = Favorites::load(deps.storage).await;
        let session = Session::restore(deps.identity, deps.store.clone()).await;
        let lifecycle = LifecycleManager::new(deps.store.clone(), deps.clock.clone(), deps.lifecycle);
        let feed = LiveFeed::start(deps.store.clone(), notifier.clone()).await?;

        let state = ClientFilterState {
            favorite_ids: favorites.ids().clone(),
            ..ClientFilterState::default()
        };
        let mut snapshots = feed.watch();
        let (view, _) = watch::channel::<PostList>(Arc::new(Vec::new()));

        let client = Arc::new_cyclic(|weak: &Weak<Self>| {
            let on_search = weak.clone();
            let search = Debouncer::spawn(SEARCH_DEBOUNCE, move |query: String| {
                if let Some(client) = on_search.upgrade() {
                    client.apply_search(query);
                }
            });

            let on_snapshot = weak.clone();
            let refresher = TaskGuard::spawn(async move {
                while snapshots.changed().await.is_ok() {
                    if let Some(client) = on_snapshot.upgrade() {
                        client.refresh();
                    }
                }
            });

            Self {
                store: deps.store,
                clock: deps.clock,
                session,
                notifier,
                lifecycle,
                feed,
                state: Mutex::new(state),
                refresh_lock: Mutex::new(()),
                favorites: tokio::sync::Mutex::new(favorites),
                view,
                search,
                _refresher: refresher,
            }
        });

        client.refresh();
        Ok(client)
    }

    fn state(&self) -> MutexGuard<'_, ClientFilterState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Re-derives the visible list from the cached snapshot and lines the
    /// countdowns up with it.
    pub fn refresh(&self) {
        let _ordered = self.refresh_lock.lock().unwrap_or_else(|e| e.into_inner());
        let snapshot = self.feed.posts();
        let state = self.state().clone();
        let visible = apply_filters(&snapshot, &state);

        self.lifecycle.reconcile(&visible);
        self.lifecycle.retain_expired(&snapshot);
        self.view.send_replace(Arc::new(visible));
    }

    /// The currently visible posts.
    pub fn visible(&self) -> PostList {
        self.view.borrow().clone()
    }

    pub fn watch_visible(&self) -> watch::Receiver<PostList> {
        self.view.subscribe()
    }

    pub fn filter_state(&self) -> ClientFilterState {
        self.state().clone()
    }

    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.notifier.subscribe()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn countdown(&self, post_id: &str) -> Option<CountdownState> {
        self.lifecycle.state(post_id)
    }

    pub fn set_platform_filter(&self, filter: PlatformFilter) {
        tracing::debug!(filter = %filter, "platform filter changed");
        self.state().platform_filter = filter;
        self.refresh();
    }

    /// Queues a search query; applied after `SEARCH_DEBOUNCE` of quiet.
    pub fn set_search_query(&self, query: &str) {
        self.search.push(query.to_string());
    }

    fn apply_search(&self, query: String) {
        self.state().search_query = query;
        self.refresh();
    }

    pub async fn is_favorite(&self, post_id: &str) -> bool {
        self.favorites.lock().await.contains(post_id)
    }

    /// Flips a favorite and persists the set. Returns the new membership.
    pub async fn toggle_favorite(&self, post_id: &str) -> Result<bool> {
        let mut favorites = self.favorites.lock().await;
        match favorites.toggle(post_id).await {
            Ok(now_favorite) => {
                self.state().favorite_ids = favorites.ids().clone();
                drop(favorites);
                self.refresh();
                Ok(now_favorite)
            }
            Err(e) => {
                self.notifier.report("saving favorites", &e);
                Err(e)
            }
        }
    }

    /// Shares a stream as the signed-in user.
    pub async fn share_stream(&self, submission: StreamSubmission) -> Result<String> {
        let result = match self.session.require_author() {
            Ok(author) => publish(self.store.as_ref(), self.clock.as_ref(), &author, submission).await,
            Err(e) => Err(e),
        };
        match &result {
            Ok(_) => self.notifier.success("Stream shared!"),
            Err(e) => self.notifier.report("sharing the stream", e),
        }
        result
    }

    fn cached_post(&self, post_id: &str) -> Option<StreamPost> {
        self.feed.posts().iter().find(|p| p.id == post_id).cloned()
    }

    /// Deletes one of the signed-in user's own posts.
    pub async fn delete_stream(&self, post_id: &str) -> Result<()> {
        let result = async {
            let author = self.session.require_author()?;
            match self.cached_post(post_id) {
                Some(post) => delete_own_post(self.store.as_ref(), &author.id, &post).await,
                // Already gone from the snapshot: nothing left to delete.
                None => Ok(()),
            }
        }
        .await;

        if let Err(e) = &result {
            self.notifier.report("deleting the stream", e);
        } else {
            self.lifecycle.untrack(post_id);
        }
        result
    }

    pub async fn rate_stream(&self, post_id: &str, stars: u8) -> Result<()> {
        let result = async {
            let author = self.session.require_author()?;
            rate(self.store.as_ref(), self.clock.as_ref(), post_id, &author.id, stars).await
        }
        .await;
        if let Err(e) = &result {
            self.notifier.report("rating the stream", e);
        }
        result
    }

    pub async fn rating_summary(&self, post_id: &str) -> Result<RatingSummary> {
        let snapshot = self
            .store
            .get_once(domains::Query::collection(domains::ratings_collection(post_id)))
            .await?;
        Ok(summarize(&snapshot))
    }

    /// Live ratings of a post; summarize each snapshot with
    /// `ratings::summarize`.
    pub async fn watch_ratings(&self, post_id: &str) -> Result<Subscription> {
        subscribe_ratings(self.store.as_ref(), post_id).await
    }

    pub async fn comment(&self, post_id: &str, content: &str) -> Result<String> {
        let result = async {
            let author = self.session.require_author()?;
            add_comment(self.store.as_ref(), self.clock.as_ref(), &author, post_id, content).await
        }
        .await;
        if let Err(e) = &result {
            self.notifier.report("posting the comment", e);
        }
        result
    }

    pub async fn delete_comment(&self, comment: &Comment) -> Result<()> {
        let result = async {
            let author = self.session.require_author()?;
            delete_own_comment(self.store.as_ref(), &author.id, comment).await
        }
        .await;
        if let Err(e) = &result {
            self.notifier.report("deleting the comment", e);
        }
        result
    }

    pub async fn watch_comments(&self, post_id: &str) -> Result<Subscription> {
        subscribe_comments(self.store.as_ref(), post_id).await
    }

    /// One-shot read of a post's comments, newest first.
    pub async fn comments(&self, post_id: &str) -> Result<Vec<Comment>> {
        let snapshot = self
            .store
            .get_once(crate::comments::comments_query(post_id))
            .await?;
        Ok(decode_comments(&snapshot))
    }
}
