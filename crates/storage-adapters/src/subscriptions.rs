//! Bookkeeping shared by the document store adapters: live query
//! registrations and the store-side clock behind `serverTimestamp`.

use std::sync::Mutex;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use domains::{Query, SnapshotSender, Subscription};

struct Subscriber {
    query: Query,
    tx: SnapshotSender,
}

/// Live queries currently open against a store.
#[derive(Default)]
pub(crate) struct SubscriberRegistry {
    subscribers: Mutex<Vec<Subscriber>>,
}

impl SubscriberRegistry {
    /// Registers a query. The returned sender is used to push the initial
    /// snapshot.
    pub fn register(&self, query: Query) -> (SnapshotSender, Subscription) {
        let (tx, subscription) = Subscription::channel();
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        subscribers.push(Subscriber {
            query,
            tx: tx.clone(),
        });
        (tx, subscription)
    }

    /// Subscribers whose query reads `collection`. Subscriptions whose
    /// receiver was dropped are pruned here.
    pub fn interested(&self, collection: &str) -> Vec<(Query, SnapshotSender)> {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        subscribers.retain(|s| !s.tx.is_closed());
        subscribers
            .iter()
            .filter(|s| s.query.collection == collection)
            .map(|s| (s.query.clone(), s.tx.clone()))
            .collect()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.subscribers.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Hands out strictly increasing instants at millisecond precision, the
/// precision `serverTimestamp` is encoded with.
pub(crate) struct ServerClock {
    last: Mutex<DateTime<Utc>>,
}

impl Default for ServerClock {
    fn default() -> Self {
        Self {
            last: Mutex::new(DateTime::<Utc>::MIN_UTC),
        }
    }
}

impl ServerClock {
    pub fn tick(&self) -> DateTime<Utc> {
        let now = Utc::now().trunc_subsecs(3);
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        let next = if now > *last {
            now
        } else {
            *last + Duration::milliseconds(1)
        };
        *last = next;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_clock_is_strictly_increasing() {
        let clock = ServerClock::default();
        let mut prev = clock.tick();
        for _ in 0..1000 {
            let next = clock.tick();
            assert!(next > prev);
            prev = next;
        }
    }

    #[test]
    fn dropped_subscriptions_are_pruned() {
        let registry = SubscriberRegistry::default();
        let (_tx, kept) = registry.register(Query::collection("streams"));
        let (_tx2, dropped) = registry.register(Query::collection("streams"));
        drop(_tx2);
        drop(dropped);
        assert_eq!(registry.interested("streams").len(), 1);
        assert_eq!(registry.len(), 1);
        drop(kept);
    }
}
