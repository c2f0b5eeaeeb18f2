//! Sharing and removing stream posts.

use domains::{
    encode_timestamp, to_fields, validate_link, validate_post, AppError, Author, Clock,
    DocumentStore, MatchPeriod, Platform, Quality, Result, StreamPost, CREATED_AT, OTHER_LEAGUE,
    STREAMS,
};
use serde::Deserialize;
use serde_json::Value;

use crate::lifecycle::delete_stream;

const MAX_TEAMS_CHARS: usize = 120;

/// The "share a stream" form as submitted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamSubmission {
    pub teams: String,
    pub platform: Platform,
    #[serde(default)]
    pub other_platform_label: String,
    pub link: String,
    #[serde(default)]
    pub match_period: MatchPeriod,
    pub league: String,
    #[serde(default)]
    pub other_league_label: String,
    pub quality: Quality,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub has_commentary: bool,
    #[serde(default)]
    pub cover_image_url: Option<String>,
}

impl StreamSubmission {
    /// Trims the form and builds the post it describes, checking every
    /// invariant before anything reaches the store.
    pub fn into_post(self, author: &Author, clock: &dyn Clock) -> Result<StreamPost> {
        let teams = self.teams.trim().to_string();
        if teams.is_empty() {
            return Err(AppError::validation("please enter the teams playing"));
        }
        if teams.chars().count() > MAX_TEAMS_CHARS {
            return Err(AppError::validation("the teams field is too long"));
        }

        let league = self.league.trim().to_string();
        if league.is_empty() {
            return Err(AppError::validation("please choose a league"));
        }

        let cover_image_url = match self.cover_image_url.map(|u| u.trim().to_string()) {
            Some(url) if !url.is_empty() => {
                validate_link(Platform::Other, &url)
                    .map_err(|_| AppError::validation("the cover image must be an http(s) URL"))?;
                Some(url)
            }
            _ => None,
        };

        let platform = self.platform;
        let post = StreamPost {
            id: String::new(),
            teams,
            platform,
            other_platform_label: if platform == Platform::Other {
                self.other_platform_label.trim().to_string()
            } else {
                String::new()
            },
            link: self.link.trim().to_string(),
            match_period: self.match_period,
            other_league_label: if league == OTHER_LEAGUE {
                self.other_league_label.trim().to_string()
            } else {
                String::new()
            },
            league,
            quality: self.quality,
            language: self.language.trim().to_string(),
            has_commentary: self.has_commentary,
            cover_image_url,
            created_at: clock.now(),
            server_timestamp: None,
            author_id: author.id.clone(),
            author_name: author.name.clone(),
            author_avatar_url: author.avatar_url.clone(),
        };

        validate_post(&post)?;
        Ok(post)
    }
}

/// Validates and stores a new post. Returns the store-assigned id.
pub async fn publish(
    store: &dyn DocumentStore,
    clock: &dyn Clock,
    author: &Author,
    submission: StreamSubmission,
) -> Result<String> {
    let post = submission.into_post(author, clock)?;

    let mut fields = to_fields(&post)?;
    fields.insert(
        CREATED_AT.to_string(),
        Value::String(encode_timestamp(post.created_at)),
    );

    let id = store.create(STREAMS, fields).await?;
    tracing::info!(post_id = %id, author_id = %author.id, platform = %post.platform, "stream shared");
    Ok(id)
}

/// Deletes `post` on behalf of its author. Idempotent.
pub async fn delete_own_post(store: &dyn DocumentStore, author_id: &str, post: &StreamPost) -> Result<()> {
    if post.author_id.is_empty() || post.author_id != author_id {
        return Err(AppError::Unauthorized(
            "only the author can delete this stream".into(),
        ));
    }
    delete_stream(store, &post.id).await?;
    tracing::info!(post_id = %post.id, "stream deleted by author");
    Ok(())
}
