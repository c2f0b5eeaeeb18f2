//! # Store documents
//!
//! The untyped shape the document store speaks: a collection path, an id and
//! a JSON object of fields. Domain models are decoded from documents here so
//! malformed data is rejected at the boundary instead of leaking into
//! rendering.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::sync::mpsc;

use crate::errors::{AppError, Result};
use crate::models::{Comment, Rating, StreamPost};
use crate::validation::validate_post;

pub const STREAMS: &str = "streams";
pub const COMMENTS: &str = "comments";
pub const USER_PROFILES: &str = "userProfiles";
pub const RATINGS: &str = "ratings";

/// Field every store write stamps with its own clock.
pub const SERVER_TIMESTAMP: &str = "serverTimestamp";
/// Client-set creation instant on posts and comments.
pub const CREATED_AT: &str = "createdAt";
/// Field comments use to point at their post.
pub const STREAM_ID: &str = "streamId";

pub type Fields = Map<String, Value>;

/// Canonical timestamp encoding. Fixed precision and a `Z` suffix keep the
/// strings lexicographically ordered.
pub fn encode_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Location of a single document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPath {
    pub collection: String,
    pub id: String,
}

impl DocPath {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }

    pub fn stream(id: &str) -> Self {
        Self::new(STREAMS, id)
    }

    pub fn rating(post_id: &str, user_id: &str) -> Self {
        Self::new(ratings_collection(post_id), user_id)
    }

    pub fn comment(id: &str) -> Self {
        Self::new(COMMENTS, id)
    }

    pub fn profile(user_id: &str) -> Self {
        Self::new(USER_PROFILES, user_id)
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// Sub-collection path holding the ratings of one post.
pub fn ratings_collection(post_id: &str) -> String {
    format!("{STREAMS}/{post_id}/{RATINGS}")
}

/// A document as delivered by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Reads an RFC 3339 timestamp field. `None` when missing or unparsable.
    pub fn timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        self.get(field)
            .and_then(Value::as_str)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|at| at.with_timezone(&Utc))
    }

    fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(Value::Object(self.fields.clone()))
            .map_err(|e| AppError::malformed(&self.id, e))
    }

    /// Validated `StreamPost`; rejects documents that break its invariants.
    pub fn to_stream_post(&self) -> Result<StreamPost> {
        let mut post: StreamPost = self.decode()?;
        post.id = self.id.clone();
        post.server_timestamp = self.timestamp(SERVER_TIMESTAMP);
        validate_post(&post).map_err(|e| AppError::malformed(&self.id, e))?;
        Ok(post)
    }

    pub fn to_comment(&self) -> Result<Comment> {
        let mut comment: Comment = self.decode()?;
        comment.id = self.id.clone();
        Ok(comment)
    }

    pub fn to_rating(&self) -> Result<Rating> {
        let rating: Rating = self.decode()?;
        if !(1..=5).contains(&rating.rating) {
            return Err(AppError::malformed(
                &self.id,
                format!("rating {} out of range", rating.rating),
            ));
        }
        Ok(rating)
    }
}

/// Serializes a model into store fields. Models skip `id` themselves.
pub fn to_fields<T: serde::Serialize>(value: &T) -> Result<Fields> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(AppError::Internal(format!(
            "expected an object, serialized {other}"
        ))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// A read over one collection: optional equality filter and ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filter: Option<(String, Value)>,
    pub order_by: Option<OrderBy>,
}

impl Query {
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            collection: name.into(),
            filter: None,
            order_by: None,
        }
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter = Some((field.into(), value.into()));
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn order_by_desc(self, field: impl Into<String>) -> Self {
        self.order_by(field, Direction::Descending)
    }

    pub fn matches(&self, doc: &Document) -> bool {
        if let Some((field, expected)) = &self.filter {
            if doc.get(field) != Some(expected) {
                return false;
            }
        }
        match &self.order_by {
            // Ordered queries exclude documents lacking the order field.
            Some(order) => doc.get(&order.field).is_some_and(|v| !v.is_null()),
            None => true,
        }
    }

    /// Filters and orders the documents of this query's collection.
    /// Ties keep their incoming order.
    pub fn apply(&self, docs: impl IntoIterator<Item = Document>) -> Vec<Document> {
        let mut selected: Vec<Document> = docs.into_iter().filter(|d| self.matches(d)).collect();
        if let Some(order) = &self.order_by {
            selected.sort_by(|a, b| {
                let ord = compare_values(a.get(&order.field), b.get(&order.field));
                match order.direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });
        }
        selected
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or_default();
            let y = y.as_f64().unwrap_or_default();
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

/// The complete result set of a query at one point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub documents: Vec<Document>,
}

impl Snapshot {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// One push on a subscription: a full replacement, or an error.
pub type SnapshotEvent = Result<Snapshot>;
pub type SnapshotSender = mpsc::UnboundedSender<SnapshotEvent>;

/// Receiving end of a live query. Dropping it cancels the subscription; the
/// store prunes it on its next push.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<SnapshotEvent>,
}

impl Subscription {
    pub fn channel() -> (SnapshotSender, Subscription) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Subscription { rx })
    }


    /// Waits for the next snapshot. `None` once the store side hung up.
    pub async fn next(&mut self) -> Option<SnapshotEvent> {
        self.rx.recv().await
    }
}
