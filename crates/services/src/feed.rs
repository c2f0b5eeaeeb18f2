//! # Live feed
//!
//! Read-through cache of the `streams` collection. Every snapshot from the
//! store replaces the cached list wholesale, so readers see either the old
//! list or the new one, never a mix.

use std::sync::Arc;

use domains::{DocumentStore, Query, Result, Snapshot, StreamPost, SERVER_TIMESTAMP, STREAMS};
use tokio::sync::watch;

use crate::notify::Notifier;
use crate::task::TaskGuard;

pub type PostList = Arc<Vec<StreamPost>>;

/// Newest first, by the store's clock.
pub fn streams_query() -> Query {
    Query::collection(STREAMS).order_by_desc(SERVER_TIMESTAMP)
}

/// Validated posts of a snapshot. Malformed documents are logged and left
/// out.
pub fn decode_posts(snapshot: &Snapshot) -> Vec<StreamPost> {
    snapshot
        .documents
        .iter()
        .filter_map(|doc| match doc.to_stream_post() {
            Ok(post) => Some(post),
            Err(e) => {
                tracing::warn!(post_id = %doc.id, error = %e, "skipping malformed stream");
                None
            }
        })
        .collect()
}

pub struct LiveFeed {
    posts: watch::Receiver<PostList>,
    _task: TaskGuard,
}

impl LiveFeed {
    /// Subscribes to the stream list. Store errors on the subscription are
    /// reported through `notifier`; the last good list stays cached.
    pub async fn start(store: Arc<dyn DocumentStore>, notifier: Notifier) -> Result<Self> {
        let mut subscription = store.subscribe(streams_query()).await?;
        let (tx, rx) = watch::channel::<PostList>(Arc::new(Vec::new()));

        let task = TaskGuard::spawn(async move {
            while let Some(event) = subscription.next().await {
                match event {
                    Ok(snapshot) => {
                        let posts = decode_posts(&snapshot);
                        tracing::debug!(
                            received = snapshot.len(),
                            valid = posts.len(),
                            "stream snapshot"
                        );
                        tx.send_replace(Arc::new(posts));
                    }
                    Err(e) => notifier.report("loading streams", &e),
                }
            }
            tracing::warn!("stream subscription closed by the store");
        });

        Ok(Self {
            posts: rx,
            _task: task,
        })
    }

    /// Current cached list.
    pub fn posts(&self) -> PostList {
        self.posts.borrow().clone()
    }

    /// Receiver that wakes on every replaced list.
    pub fn watch(&self) -> watch::Receiver<PostList> {
        self.posts.clone()
    }
}
