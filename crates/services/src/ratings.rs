//! Star ratings: one per user per post, overwritten on re-rate.

use domains::{
    ratings_collection, to_fields, AppError, Clock, DocPath, DocumentStore, Query, Rating, Result,
    Snapshot, Subscription,
};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RatingSummary {
    pub count: usize,
    pub average: f32,
}

/// Stores `user_id`'s rating of `post_id`, replacing any previous one.
pub async fn rate(
    store: &dyn DocumentStore,
    clock: &dyn Clock,
    post_id: &str,
    user_id: &str,
    stars: u8,
) -> Result<()> {
    if !(1..=5).contains(&stars) {
        return Err(AppError::validation("ratings go from 1 to 5 stars"));
    }
    let rating = Rating {
        user_id: user_id.to_string(),
        rating: stars,
        updated_at: Some(clock.now()),
    };
    store
        .set(&DocPath::rating(post_id, user_id), to_fields(&rating)?, false)
        .await?;
    tracing::debug!(post_id, user_id, stars, "stream rated");
    Ok(())
}

pub async fn subscribe_ratings(store: &dyn DocumentStore, post_id: &str) -> Result<Subscription> {
    store.subscribe(Query::collection(ratings_collection(post_id))).await
}

fn ratings(snapshot: &Snapshot) -> impl Iterator<Item = Rating> + '_ {
    snapshot.documents.iter().filter_map(|doc| match doc.to_rating() {
        Ok(rating) => Some(rating),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring malformed rating");
            None
        }
    })
}

pub fn summarize(snapshot: &Snapshot) -> RatingSummary {
    let (count, total) = ratings(snapshot).fold((0usize, 0u32), |(n, sum), r| {
        (n + 1, sum + u32::from(r.rating))
    });
    RatingSummary {
        count,
        average: if count == 0 { 0.0 } else { total as f32 / count as f32 },
    }
}

/// The stars `user_id` gave, if any.
pub fn user_rating(snapshot: &Snapshot, user_id: &str) -> Option<u8> {
    ratings(snapshot)
        .find(|r| r.user_id == user_id)
        .map(|r| r.rating)
}
