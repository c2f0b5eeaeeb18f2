//! # Domain Models
//!
//! These structs represent the core entities of ULTRAGOL. Field names on the
//! wire are camelCase; the store assigns ids, so `id` never travels inside
//! the document body.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::AppError;

/// League value meaning "see `other_league_label`".
pub const OTHER_LEAGUE: &str = "other";

/// Where the stream is hosted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Youtube,
    Instagram,
    Tiktok,
    Facebook,
    Twitch,
    Kick,
    Other,
}

impl Platform {
    pub const ALL: [Platform; 7] = [
        Platform::Youtube,
        Platform::Instagram,
        Platform::Tiktok,
        Platform::Facebook,
        Platform::Twitch,
        Platform::Kick,
        Platform::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Youtube => "youtube",
            Platform::Instagram => "instagram",
            Platform::Tiktok => "tiktok",
            Platform::Facebook => "facebook",
            Platform::Twitch => "twitch",
            Platform::Kick => "kick",
            Platform::Other => "other",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::validation(format!("unknown platform '{s}'")))
    }
}

/// Which part of the match is being played when the link is shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchPeriod {
    FirstHalf,
    Halftime,
    SecondHalf,
    ExtraTime,
    Penalties,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Advertised stream resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quality {
    #[serde(rename = "4k")]
    Uhd4k,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "360p")]
    P360,
}

impl Quality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Uhd4k => "4k",
            Quality::P1080 => "1080p",
            Quality::P720 => "720p",
            Quality::P480 => "480p",
            Quality::P360 => "360p",
        }
    }
}

/// A user-submitted live-stream announcement.
///
/// Lives for one hour after `created_at`, then the lifecycle manager
/// deletes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamPost {
    #[serde(default, skip_serializing)]
    pub id: String,
    pub teams: String,
    pub platform: Platform,
    #[serde(default)]
    pub other_platform_label: String,
    pub link: String,
    #[serde(default)]
    pub match_period: MatchPeriod,
    #[serde(default)]
    pub league: String,
    #[serde(default)]
    pub other_league_label: String,
    pub quality: Quality,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub has_commentary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
    /// Client clock at submission. Authoritative for TTL math.
    pub created_at: DateTime<Utc>,
    /// Store-assigned; only used for ordering.
    #[serde(default, skip_serializing)]
    pub server_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub author_id: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_avatar_url: Option<String>,
}

impl StreamPost {
    /// The label shown for the league, resolving the "other" indirection.
    pub fn league_display(&self) -> &str {
        if self.league == OTHER_LEAGUE {
            &self.other_league_label
        } else {
            &self.league
        }
    }

    /// The label shown for the platform, resolving the "other" indirection.
    pub fn platform_display(&self) -> &str {
        match self.platform {
            Platform::Other => &self.other_platform_label,
            p => p.as_str(),
        }
    }
}

/// One user's star rating of one post. Keyed by user id under the post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub user_id: String,
    pub rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Free-text note attached to a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(default, skip_serializing)]
    pub id: String,
    #[serde(rename = "streamId")]
    pub post_id: String,
    pub author_id: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_avatar_url: Option<String>,
    /// Stored as typed; escaped at render time.
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Optional overrides merged over the identity provider's defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// What the external identity provider knows about a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

/// The name and avatar stamped onto posts and comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: String,
    pub name: String,
    pub avatar_url: Option<String>,
}
