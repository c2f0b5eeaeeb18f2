//! Comments on stream posts. Stored flat in `comments`, pointing at their
//! post through `streamId`.

use domains::{
    encode_timestamp, to_fields, AppError, Author, Clock, Comment, DocPath, DocumentStore, Query,
    Result, Snapshot, Subscription, COMMENTS, CREATED_AT, SERVER_TIMESTAMP, STREAM_ID,
};
use serde_json::Value;

pub const MAX_COMMENT_CHARS: usize = 500;

pub fn comments_query(post_id: &str) -> Query {
    Query::collection(COMMENTS)
        .where_eq(STREAM_ID, post_id)
        .order_by_desc(SERVER_TIMESTAMP)
}

/// Stores a comment as typed (trimmed). Escaping happens at render time.
pub async fn add_comment(
    store: &dyn DocumentStore,
    clock: &dyn Clock,
    author: &Author,
    post_id: &str,
    content: &str,
) -> Result<String> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::validation("comments cannot be empty"));
    }
    if content.chars().count() > MAX_COMMENT_CHARS {
        return Err(AppError::validation(format!(
            "comments are limited to {MAX_COMMENT_CHARS} characters"
        )));
    }

    let comment = Comment {
        id: String::new(),
        post_id: post_id.to_string(),
        author_id: author.id.clone(),
        author_name: author.name.clone(),
        author_avatar_url: author.avatar_url.clone(),
        content: content.to_string(),
        created_at: clock.now(),
    };
    let mut fields = to_fields(&comment)?;
    fields.insert(
        CREATED_AT.to_string(),
        Value::String(encode_timestamp(comment.created_at)),
    );

    let id = store.create(COMMENTS, fields).await?;
    tracing::debug!(comment_id = %id, post_id, "comment added");
    Ok(id)
}

pub async fn subscribe_comments(store: &dyn DocumentStore, post_id: &str) -> Result<Subscription> {
    store.subscribe(comments_query(post_id)).await
}

pub fn decode_comments(snapshot: &Snapshot) -> Vec<Comment> {
    snapshot
        .documents
        .iter()
        .filter_map(|doc| match doc.to_comment() {
            Ok(comment) => Some(comment),
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed comment");
                None
            }
        })
        .collect()
}

pub async fn delete_own_comment(store: &dyn DocumentStore, author_id: &str, comment: &Comment) -> Result<()> {
    if comment.author_id != author_id {
        return Err(AppError::Unauthorized(
            "only the author can delete this comment".into(),
        ));
    }
    store.delete(&DocPath::comment(&comment.id)).await
}
