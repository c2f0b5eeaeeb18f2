//! Always-on lifecycle host: keeps countdowns for every live post and runs
//! the sweep, so TTL holds even when no browser has the page open.

use std::sync::Arc;

use domains::{Clock, DocumentStore, Result};

use crate::feed::LiveFeed;
use crate::lifecycle::{LifecycleConfig, LifecycleManager};
use crate::notify::Notifier;
use crate::sweeper::Sweeper;
use crate::task::TaskGuard;

pub struct LifecycleHost {
    feed: LiveFeed,
    manager: Arc<LifecycleManager>,
    _reconciler: TaskGuard,
    _sweeper: TaskGuard,
}

impl LifecycleHost {
    pub async fn start(
        store: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
        config: LifecycleConfig,
        notifier: Notifier,
    ) -> Result<Self> {
        let feed = LiveFeed::start(store.clone(), notifier).await?;
        let manager = LifecycleManager::new(store.clone(), clock.clone(), config.clone());

        let mut posts = feed.watch();
        let reconciled = manager.clone();
        let reconciler = TaskGuard::spawn(async move {
            loop {
                let snapshot = posts.borrow_and_update().clone();
                reconciled.reconcile(&snapshot);
                reconciled.retain_expired(&snapshot);
                if posts.changed().await.is_err() {
                    break;
                }
            }
        });

        let sweeper = Arc::new(Sweeper::new(store, clock)).spawn(&config);
        tracing::info!("lifecycle host running");

        Ok(Self {
            feed,
            manager,
            _reconciler: reconciler,
            _sweeper: sweeper,
        })
    }

    pub fn feed(&self) -> &LiveFeed {
        &self.feed
    }

    pub fn manager(&self) -> &Arc<LifecycleManager> {
        &self.manager
    }
}
