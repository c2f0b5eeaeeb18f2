//! # In-memory document store
//!
//! Process-local implementation of `DocumentStore`. Backs the server when no
//! database is configured and doubles as the store in scenario tests.

use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::DashMap;
use domains::{
    encode_timestamp, DocPath, Document, DocumentStore, Fields, Query, Result, Snapshot,
    Subscription, SERVER_TIMESTAMP,
};
use serde_json::Value;
use uuid::Uuid;

use crate::subscriptions::{ServerClock, SubscriberRegistry};

#[derive(Default)]
pub struct MemoryDocumentStore {
    docs: DashMap<DocPath, Fields>,
    subscribers: SubscriberRegistry,
    clock: ServerClock,
    /// Serializes write + notify so every subscriber sees snapshots in
    /// write order.
    write_lock: Mutex<()>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents across all collections.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    fn collect(&self, query: &Query) -> Snapshot {
        let mut docs: Vec<Document> = self
            .docs
            .iter()
            .filter(|entry| entry.key().collection == query.collection)
            .map(|entry| Document::new(entry.key().id.clone(), entry.value().clone()))
            .collect();
        docs.sort_by(|a, b| a.id.cmp(&b.id));
        Snapshot::new(query.apply(docs))
    }

    fn publish(&self, collection: &str) {
        for (query, tx) in self.subscribers.interested(collection) {
            // A send failure means the receiver is gone; pruned next time.
            let _ = tx.send(Ok(self.collect(&query)));
        }
    }

    fn stamp(&self, fields: &mut Fields) {
        fields.insert(
            SERVER_TIMESTAMP.to_string(),
            Value::String(encode_timestamp(self.clock.tick())),
        );
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn subscribe(&self, query: Query) -> Result<Subscription> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let initial = self.collect(&query);
        let (tx, subscription) = self.subscribers.register(query);
        let _ = tx.send(Ok(initial));
        Ok(subscription)
    }

    async fn create(&self, collection: &str, mut fields: Fields) -> Result<String> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let id = Uuid::new_v4().simple().to_string();
        self.stamp(&mut fields);
        self.docs.insert(DocPath::new(collection, &id), fields);
        self.publish(collection);
        tracing::debug!(collection, id = %id, "document created");
        Ok(id)
    }

    async fn set(&self, path: &DocPath, mut fields: Fields, merge: bool) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.stamp(&mut fields);
        let merged = match self.docs.get(path) {
            Some(existing) if merge => {
                let mut base = existing.clone();
                base.extend(fields);
                base
            }
            _ => fields,
        };
        self.docs.insert(path.clone(), merged);
        self.publish(&path.collection);
        Ok(())
    }

    async fn delete(&self, path: &DocPath) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        if self.docs.remove(path).is_some() {
            self.publish(&path.collection);
            tracing::debug!(%path, "document deleted");
        }
        Ok(())
    }

    async fn get_once(&self, query: Query) -> Result<Snapshot> {
        Ok(self.collect(&query))
    }

    async fn get(&self, path: &DocPath) -> Result<Option<Document>> {
        Ok(self
            .docs
            .get(path)
            .map(|fields| Document::new(path.id.clone(), fields.clone())))
    }
}
