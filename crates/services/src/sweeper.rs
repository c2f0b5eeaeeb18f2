//! Periodic TTL sweep over every stream post, independent of what any
//! client has on screen.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use domains::{Clock, Document, DocumentStore, Query, Result, CREATED_AT, STREAMS};
use futures::future::join_all;
use tokio::time::{Instant, MissedTickBehavior};

use crate::lifecycle::{delete_stream, remaining_since, LifecycleConfig};
use crate::task::TaskGuard;

pub struct Sweeper {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

/// Expiry straight from the raw document. A missing or unparsable
/// `createdAt` counts as expired so no post can outlive its TTL.
fn document_expired(doc: &Document, now: DateTime<Utc>) -> bool {
    match doc.timestamp(CREATED_AT) {
        Some(created_at) => remaining_since(created_at, now) <= Duration::zero(),
        None => {
            tracing::warn!(post_id = %doc.id, "stream has no parsable createdAt, treating as expired");
            true
        }
    }
}

impl Sweeper {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Deletes every expired post, concurrently. Returns how many deletes
    /// succeeded.
    pub async fn sweep_once(&self) -> Result<usize> {
        let snapshot = self.store.get_once(Query::collection(STREAMS)).await?;
        let now = self.clock.now();

        let expired: Vec<&str> = snapshot
            .documents
            .iter()
            .filter(|doc| document_expired(doc, now))
            .map(|doc| doc.id.as_str())
            .collect();

        if expired.is_empty() {
            tracing::debug!(scanned = snapshot.len(), "sweep found nothing to remove");
            return Ok(0);
        }

        let results = join_all(
            expired
                .iter()
                .map(|id| delete_stream(self.store.as_ref(), id)),
        )
        .await;

        let mut removed = 0;
        for (id, result) in expired.iter().zip(results) {
            match result {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!(post_id = id, error = %e, "sweep failed to delete stream"),
            }
        }

        tracing::info!(removed, scanned = snapshot.len(), "expired streams removed");
        Ok(removed)
    }

    /// Runs `sweep_once` after the grace delay, then on every interval.
    /// The returned guard stops the loop when dropped.
    pub fn spawn(self: Arc<Self>, config: &LifecycleConfig) -> TaskGuard {
        let grace = config.sweep_grace;
        let interval = config.sweep_interval;
        tracing::info!(
            grace_secs = grace.as_secs(),
            interval_secs = interval.as_secs(),
            "starting stream sweeper"
        );

        TaskGuard::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + grace, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = self.sweep_once().await {
                    tracing::error!(error = %e, "stream sweep failed");
                }
            }
        })
    }
}
