//! # Search/Filter engine
//!
//! Derives the visible posts from the live snapshot and the client's filter
//! state. Pure: the snapshot is never mutated and the upstream order
//! (newest `serverTimestamp` first) is kept.

use std::collections::BTreeSet;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use domains::{Platform, StreamPost};

use crate::search::contains_ci;

/// Platform selector of the filter bar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PlatformFilter {
    #[default]
    All,
    Favorites,
    /// Lowercased platform token, e.g. "youtube" or a free label like
    /// "rumble" that matches `other` posts by their label.
    Platform(String),
}

impl FromStr for PlatformFilter {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_lowercase();
        Ok(match token.as_str() {
            "" | "all" => PlatformFilter::All,
            "favorites" => PlatformFilter::Favorites,
            _ => PlatformFilter::Platform(token),
        })
    }
}

impl fmt::Display for PlatformFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformFilter::All => f.write_str("all"),
            PlatformFilter::Favorites => f.write_str("favorites"),
            PlatformFilter::Platform(token) => f.write_str(token),
        }
    }
}

/// Process-local view state. Never sent to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientFilterState {
    pub platform_filter: PlatformFilter,
    pub search_query: String,
    pub favorite_ids: BTreeSet<String>,
}

fn matches_platform(post: &StreamPost, filter: &PlatformFilter, favorites: &BTreeSet<String>) -> bool {
    match filter {
        PlatformFilter::All => true,
        PlatformFilter::Favorites => favorites.contains(&post.id),
        PlatformFilter::Platform(token) => {
            post.platform.as_str() == token
                || (post.platform == Platform::Other && contains_ci(&post.other_platform_label, token))
        }
    }
}

fn matches_query(post: &StreamPost, query: &str) -> bool {
    contains_ci(&post.teams, query)
        || contains_ci(post.league_display(), query)
        || contains_ci(&post.other_platform_label, query)
}

/// Posts visible under `state`, in snapshot order.
pub fn apply_filters(all: &[StreamPost], state: &ClientFilterState) -> Vec<StreamPost> {
    let query = state.search_query.trim();
    all.iter()
        .filter(|post| matches_platform(post, &state.platform_filter, &state.favorite_ids))
        .filter(|post| query.is_empty() || matches_query(post, query))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_post;

    fn state(platform: &str, query: &str) -> ClientFilterState {
        ClientFilterState {
            platform_filter: platform.parse().unwrap(),
            search_query: query.to_string(),
            favorite_ids: BTreeSet::new(),
        }
    }

    fn posts() -> Vec<StreamPost> {
        let mut rumble = sample_post("a", "Boca vs River", Platform::Other);
        rumble.other_platform_label = "Rumble".into();
        rumble.link = "https://rumble.com/live".into();
        vec![
            rumble,
            sample_post("b", "Real Madrid vs Sevilla", Platform::Youtube),
            sample_post("c", "Barcelona vs Girona", Platform::Twitch),
        ]
    }

    fn ids(posts: &[StreamPost]) -> Vec<&str> {
        posts.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn default_state_returns_everything_in_order() {
        let all = posts();
        assert_eq!(apply_filters(&all, &state("all", "")), all);
    }

    #[test]
    fn filtering_is_idempotent() {
        let all = posts();
        let s = state("youtube", "real");
        let once = apply_filters(&all, &s);
        assert_eq!(apply_filters(&once, &s), once);
    }

    #[test]
    fn other_platform_matches_by_label() {
        let all = posts();
        assert_eq!(ids(&apply_filters(&all, &state("rumble", ""))), ["a"]);
        assert_eq!(ids(&apply_filters(&all, &state("youtube", ""))), ["b"]);
        assert_eq!(ids(&apply_filters(&all, &state("RUMBLE", ""))), ["a"]);
    }

    #[test]
    fn search_matches_teams_case_insensitively() {
        let all = posts();
        assert_eq!(ids(&apply_filters(&all, &state("all", "Real"))), ["b"]);
        assert_eq!(ids(&apply_filters(&all, &state("all", "  girona "))), ["c"]);
    }

    #[test]
    fn search_matches_league_and_platform_label() {
        let mut all = posts();
        all[2].league = "other".into();
        all[2].other_league_label = "Copa del Rey".into();
        assert_eq!(ids(&apply_filters(&all, &state("all", "copa"))), ["c"]);
        assert_eq!(ids(&apply_filters(&all, &state("all", "rumb"))), ["a"]);
    }

    #[test]
    fn favorites_filter_keeps_only_favorited_ids() {
        let all = posts();
        let mut s = state("favorites", "");
        s.favorite_ids.insert("c".into());
        s.favorite_ids.insert("zzz".into());
        assert_eq!(ids(&apply_filters(&all, &s)), ["c"]);
    }

    #[test]
    fn platform_and_query_compose() {
        let all = posts();
        assert!(apply_filters(&all, &state("twitch", "madrid")).is_empty());
    }

    #[test]
    fn parses_filter_tokens() {
        assert_eq!("".parse::<PlatformFilter>().unwrap(), PlatformFilter::All);
        assert_eq!("Favorites".parse::<PlatformFilter>().unwrap(), PlatformFilter::Favorites);
        assert_eq!(
            "Kick".parse::<PlatformFilter>().unwrap(),
            PlatformFilter::Platform("kick".into())
        );
    }
}
