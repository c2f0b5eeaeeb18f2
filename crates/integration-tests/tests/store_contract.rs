//! Both document stores must behave the same behind the port.

use std::sync::Arc;

use chrono::Utc;
use domains::{DocPath, DocumentStore, Fields, Query, SERVER_TIMESTAMP, STREAMS};
use integration_tests::stream_fields;
use serde_json::json;
use services::feed::{decode_posts, streams_query};
use storage_adapters::{MemoryDocumentStore, SqliteDocumentStore};

async fn stores() -> Vec<(&'static str, Arc<dyn DocumentStore>)> {
    vec![
        ("memory", Arc::new(MemoryDocumentStore::new())),
        (
            "sqlite",
            Arc::new(SqliteDocumentStore::new("sqlite::memory:").await.unwrap()),
        ),
    ]
}

#[tokio::test]
async fn feed_query_orders_newest_first() {
    for (name, store) in stores().await {
        let first = store.create(STREAMS, stream_fields("A vs B", Utc::now())).await.unwrap();
        let second = store.create(STREAMS, stream_fields("C vs D", Utc::now())).await.unwrap();

        let posts = decode_posts(&store.get_once(streams_query()).await.unwrap());
        let ids: Vec<_> = posts.iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids, [second, first], "{name}");
    }
}

#[tokio::test]
async fn delete_is_idempotent() {
    for (name, store) in stores().await {
        let id = store.create(STREAMS, stream_fields("A vs B", Utc::now())).await.unwrap();
        let path = DocPath::stream(&id);
        store.delete(&path).await.unwrap();
        store.delete(&path).await.unwrap();
        assert!(store.get(&path).await.unwrap().is_none(), "{name}");
    }
}

#[tokio::test]
async fn merge_keeps_fields_and_restamps() {
    for (name, store) in stores().await {
        let path = DocPath::profile("u1");
        let mut first = Fields::new();
        first.insert("displayName".into(), json!("Ana"));
        first.insert("avatarUrl".into(), json!("https://img.example/a.png"));
        store.set(&path, first, false).await.unwrap();
        let stamped = store.get(&path).await.unwrap().unwrap().timestamp(SERVER_TIMESTAMP);

        let mut update = Fields::new();
        update.insert("displayName".into(), json!("Ana B"));
        store.set(&path, update, true).await.unwrap();

        let doc = store.get(&path).await.unwrap().unwrap();
        assert_eq!(doc.get("displayName"), Some(&json!("Ana B")), "{name}");
        assert_eq!(doc.get("avatarUrl"), Some(&json!("https://img.example/a.png")), "{name}");
        assert!(doc.timestamp(SERVER_TIMESTAMP) > stamped, "{name}");
    }
}

#[tokio::test]
async fn subscriptions_deliver_full_snapshots() {
    for (name, store) in stores().await {
        let mut sub = store.subscribe(Query::collection(STREAMS)).await.unwrap();
        let initial = sub.next().await.unwrap().unwrap();
        assert!(initial.is_empty(), "{name}");

        let id = store.create(STREAMS, stream_fields("A vs B", Utc::now())).await.unwrap();
        let after_create = sub.next().await.unwrap().unwrap();
        assert_eq!(after_create.len(), 1, "{name}");

        store.delete(&DocPath::stream(&id)).await.unwrap();
        let after_delete = sub.next().await.unwrap().unwrap();
        assert!(after_delete.is_empty(), "{name}");
    }
}
