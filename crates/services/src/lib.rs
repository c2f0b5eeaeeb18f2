//! ultragol/crates/services/src/lib.rs
//!
//! Application services: post lifecycle, live feed, filtering, favorites,
//! notices and the user actions built on the domain ports.

pub mod client;
pub mod clock;
pub mod comments;
pub mod debounce;
pub mod favorites;
pub mod feed;
pub mod filter;
pub mod host;
pub mod lifecycle;
pub mod notify;
pub mod profiles;
pub mod ratings;
pub mod search;
pub mod session;
pub mod streams;
pub mod sweeper;
pub mod task;

pub use client::{ClientDeps, UltragolClient};
pub use clock::ManualClock;
pub use favorites::{Favorites, FAVORITES_KEY};
pub use feed::{LiveFeed, PostList};
pub use filter::{apply_filters, ClientFilterState, PlatformFilter};
pub use host::LifecycleHost;
pub use lifecycle::{
    delete_stream, format_remaining, is_expired, remaining, CountdownState, LifecycleConfig,
    LifecycleManager, POST_TTL_MS,
};
pub use notify::{Notice, NoticeLevel, Notifier};
pub use search::{contains_ci, highlight, Segment};
pub use streams::{publish, StreamSubmission};
pub use sweeper::Sweeper;
pub use task::TaskGuard;

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{DateTime, Utc};
    use domains::{
        encode_timestamp, to_fields, Author, Clock, Fields, MatchPeriod, Platform, Quality,
        StreamPost, CREATED_AT,
    };
    use serde_json::Value;
    use tokio::time::Instant;

    use crate::streams::StreamSubmission;

    /// Wall time that follows tokio's (possibly paused) clock.
    pub struct PausedClock {
        origin: DateTime<Utc>,
        started: Instant,
    }

    impl PausedClock {
        pub fn start_at(origin: DateTime<Utc>) -> Self {
            Self {
                origin,
                started: Instant::now(),
            }
        }
    }

    impl Clock for PausedClock {
        fn now(&self) -> DateTime<Utc> {
            let elapsed = chrono::Duration::from_std(self.started.elapsed()).unwrap();
            self.origin + elapsed
        }
    }

    fn link_for(platform: Platform) -> &'static str {
        match platform {
            Platform::Youtube => "https://www.youtube.com/watch?v=live",
            Platform::Instagram => "https://www.instagram.com/live",
            Platform::Tiktok => "https://www.tiktok.com/@club/live",
            Platform::Facebook => "https://fb.watch/live",
            Platform::Twitch => "https://www.twitch.tv/club",
            Platform::Kick => "https://kick.com/club",
            Platform::Other => "https://stream.example/live",
        }
    }

    pub fn sample_post(id: &str, teams: &str, platform: Platform) -> StreamPost {
        StreamPost {
            id: id.to_string(),
            teams: teams.to_string(),
            platform,
            other_platform_label: if platform == Platform::Other {
                "Web".into()
            } else {
                String::new()
            },
            link: link_for(platform).to_string(),
            match_period: MatchPeriod::FirstHalf,
            league: "laliga".into(),
            other_league_label: String::new(),
            quality: Quality::P1080,
            language: "es".into(),
            has_commentary: true,
            cover_image_url: None,
            created_at: Utc::now(),
            server_timestamp: None,
            author_id: "u1".into(),
            author_name: "Ana".into(),
            author_avatar_url: None,
        }
    }

    pub fn post_created_at(id: &str, created_at: DateTime<Utc>) -> StreamPost {
        StreamPost {
            created_at,
            ..sample_post(id, "Real Madrid vs Barcelona", Platform::Youtube)
        }
    }

    /// Store fields of a valid youtube post created at `created_at`.
    pub fn stream_fields(created_at: DateTime<Utc>) -> Fields {
        let post = post_created_at("", created_at);
        let mut fields = to_fields(&post).unwrap();
        fields.insert(CREATED_AT.into(), Value::String(encode_timestamp(created_at)));
        fields
    }

    pub fn author(id: &str) -> Author {
        Author {
            id: id.to_string(),
            name: "Ana".into(),
            avatar_url: None,
        }
    }

    pub fn submission() -> StreamSubmission {
        StreamSubmission {
            teams: "Real Madrid vs Barcelona".into(),
            platform: Platform::Youtube,
            other_platform_label: String::new(),
            link: "https://www.youtube.com/watch?v=clasico".into(),
            match_period: MatchPeriod::SecondHalf,
            league: "laliga".into(),
            other_league_label: String::new(),
            quality: Quality::P720,
            language: "es".into(),
            has_commentary: true,
            cover_image_url: None,
        }
    }
}
