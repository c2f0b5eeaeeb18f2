//! # SQLite document store
//!
//! Persists documents as JSON text keyed by `(collection, id)`. Queries load
//! the collection and filter/order in process; live queries are re-evaluated
//! after every write to their collection.

use std::str::FromStr;

use async_trait::async_trait;
use domains::{
    encode_timestamp, AppError, DocPath, Document, DocumentStore, Fields, Query, Result,
    Snapshot, Subscription, SERVER_TIMESTAMP,
};
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::subscriptions::{ServerClock, SubscriberRegistry};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id         TEXT NOT NULL,
    fields     TEXT NOT NULL,
    PRIMARY KEY (collection, id)
)";

fn store_error(err: sqlx::Error) -> AppError {
    AppError::Unavailable(err.to_string())
}

pub struct SqliteDocumentStore {
    pool: SqlitePool,
    subscribers: SubscriberRegistry,
    clock: ServerClock,
    write_lock: Mutex<()>,
}

impl SqliteDocumentStore {
    /// Connects (creating the file if needed) and ensures the schema exists.
    ///
    /// `sqlite::memory:` gets a single long-lived connection, since every
    /// connection to an in-memory database sees its own empty database.
    pub async fn new(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(store_error)?
            .create_if_missing(true);

        let in_memory = url.contains(":memory:");
        let mut pool_options = SqlitePoolOptions::new().max_connections(if in_memory { 1 } else { 5 });
        if in_memory {
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }
        let pool = pool_options.connect_with(options).await.map_err(store_error)?;

        sqlx::query(SCHEMA).execute(&pool).await.map_err(store_error)?;
        tracing::info!(url, "sqlite document store ready");

        Ok(Self {
            pool,
            subscribers: SubscriberRegistry::default(),
            clock: ServerClock::default(),
            write_lock: Mutex::new(()),
        })
    }

    async fn collect(&self, query: &Query) -> Result<Snapshot> {
        let rows = sqlx::query("SELECT id, fields FROM documents WHERE collection = ? ORDER BY id")
            .bind(&query.collection)
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;

        let mut docs = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.try_get("id").map_err(store_error)?;
            let raw: String = row.try_get("fields").map_err(store_error)?;
            docs.push(Document::new(id, parse_fields(&raw)?));
        }
        Ok(Snapshot::new(query.apply(docs)))
    }

    async fn publish(&self, collection: &str) {
        for (query, tx) in self.subscribers.interested(collection) {
            let event = self.collect(&query).await;
            let _ = tx.send(event);
        }
    }

    async fn load(&self, path: &DocPath) -> Result<Option<Fields>> {
        let row = sqlx::query("SELECT fields FROM documents WHERE collection = ? AND id = ?")
            .bind(&path.collection)
            .bind(&path.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        match row {
            Some(row) => {
                let raw: String = row.try_get("fields").map_err(store_error)?;
                Ok(Some(parse_fields(&raw)?))
            }
            None => Ok(None),
        }
    }

    async fn upsert(&self, path: &DocPath, fields: &Fields) -> Result<()> {
        sqlx::query(
            "INSERT INTO documents (collection, id, fields) VALUES (?, ?, ?)
             ON CONFLICT(collection, id) DO UPDATE SET fields = excluded.fields",
        )
        .bind(&path.collection)
        .bind(&path.id)
        .bind(serde_json::to_string(fields)?)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(())
    }

    fn stamp(&self, fields: &mut Fields) {
        fields.insert(
            SERVER_TIMESTAMP.to_string(),
            Value::String(encode_timestamp(self.clock.tick())),
        );
    }
}

fn parse_fields(raw: &str) -> Result<Fields> {
    match serde_json::from_str(raw)? {
        Value::Object(map) => Ok(map),
        _ => Err(AppError::Internal("stored document is not a JSON object".into())),
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn subscribe(&self, query: Query) -> Result<Subscription> {
        let _guard = self.write_lock.lock().await;
        let initial = self.collect(&query).await?;
        let (tx, subscription) = self.subscribers.register(query);
        let _ = tx.send(Ok(initial));
        Ok(subscription)
    }

    async fn create(&self, collection: &str, mut fields: Fields) -> Result<String> {
        let _guard = self.write_lock.lock().await;
        let id = Uuid::new_v4().simple().to_string();
        self.stamp(&mut fields);
        self.upsert(&DocPath::new(collection, &id), &fields).await?;
        self.publish(collection).await;
        Ok(id)
    }

    async fn set(&self, path: &DocPath, mut fields: Fields, merge: bool) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.stamp(&mut fields);
        let merged = match self.load(path).await? {
            Some(mut base) if merge => {
                base.extend(fields);
                base
            }
            _ => fields,
        };
        self.upsert(path, &merged).await?;
        self.publish(&path.collection).await;
        Ok(())
    }

    async fn delete(&self, path: &DocPath) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(&path.collection)
            .bind(&path.id)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        if result.rows_affected() > 0 {
            self.publish(&path.collection).await;
        }
        Ok(())
    }

    async fn get_once(&self, query: Query) -> Result<Snapshot> {
        self.collect(&query).await
    }

    async fn get(&self, path: &DocPath) -> Result<Option<Document>> {
        Ok(self
            .load(path)
            .await?
            .map(|fields| Document::new(path.id.clone(), fields)))
    }
}
