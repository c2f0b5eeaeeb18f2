//! # Ports
//!
//! Any adapter must implement these traits to be wired into the client or
//! the server binary.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::document::{DocPath, Document, Fields, Query, Snapshot, Subscription};
use crate::errors::Result;
use crate::models::Identity;

/// Contract of the external document store.
///
/// Every write stamps `serverTimestamp` with a store-assigned instant that is
/// strictly increasing per store. Subscriptions deliver full result sets,
/// never deltas, in write order.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Opens a live query. The first event is the current result set.
    async fn subscribe(&self, query: Query) -> Result<Subscription>;

    /// Adds a document with a store-assigned id.
    async fn create(&self, collection: &str, fields: Fields) -> Result<String>;

    /// Writes a document at a known path. With `merge` the given fields are
    /// layered over the existing ones; otherwise the document is replaced.
    async fn set(&self, path: &DocPath, fields: Fields, merge: bool) -> Result<()>;

    /// Removes a document. Removing a missing document succeeds.
    async fn delete(&self, path: &DocPath) -> Result<()>;

    /// One-shot read of a query.
    async fn get_once(&self, query: Query) -> Result<Snapshot>;

    /// One-shot read of a single document.
    async fn get(&self, path: &DocPath) -> Result<Option<Document>>;
}

/// Device-local key/value storage (the browser's localStorage equivalent).
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait LocalStorage: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>>;
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;
    async fn remove_item(&self, key: &str) -> Result<()>;
}

/// External identity provider (popup sign-in flow).
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self) -> Result<Identity>;
    async fn sign_out(&self) -> Result<()>;
    fn current(&self) -> Option<Identity>;
}

/// Source of "now". TTL math reads the client clock through this.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
