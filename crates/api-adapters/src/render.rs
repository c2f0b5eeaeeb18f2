//! Server-side rendering of stream cards.

use askama::Template;
use domains::{MatchPeriod, Platform, Quality, StreamPost};
use services::ratings::RatingSummary;
use services::{highlight, CountdownState, Segment};

use crate::sanitize::{escape_attr, escape_text, safe_url};

/// Per-viewer state a card depends on.
#[derive(Debug, Clone, Default)]
pub struct CardView<'a> {
    /// Active search query; matches are wrapped in `<mark>`.
    pub query: &'a str,
    pub countdown: Option<&'a CountdownState>,
    pub favorite: bool,
    pub rating: Option<RatingSummary>,
    /// Signed-in user, if any. Authors get a delete button.
    pub viewer_id: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "stream_card.html")]
struct StreamCardTemplate<'a> {
    id: &'a str,
    platform_token: &'static str,
    platform_icon: &'static str,
    platform_html: String,
    teams_html: String,
    league_html: String,
    period: &'static str,
    quality: &'static str,
    quality_icon: &'static str,
    language: Option<&'a str>,
    has_commentary: bool,
    cover_href: Option<String>,
    author_name: &'a str,
    rating_label: Option<String>,
    link_href: String,
    countdown: String,
    expired: bool,
    favorite: bool,
    can_delete: bool,
}

/// Escapes `text` and wraps every case-insensitive match of `query`.
pub fn highlighted(text: &str, query: &str) -> String {
    highlight(text, query)
        .into_iter()
        .map(|segment| match segment {
            Segment::Plain(s) => escape_text(s),
            Segment::Match(s) => format!("<mark class=\"search-highlight\">{}</mark>", escape_text(s)),
        })
        .collect()
}

pub fn platform_icon(platform: Platform) -> &'static str {
    match platform {
        Platform::Youtube => "fab fa-youtube",
        Platform::Instagram => "fab fa-instagram",
        Platform::Tiktok => "fab fa-tiktok",
        Platform::Facebook => "fab fa-facebook",
        Platform::Twitch => "fab fa-twitch",
        Platform::Kick => "fas fa-play-circle",
        Platform::Other => "fas fa-desktop",
    }
}

pub fn quality_icon(quality: Quality) -> &'static str {
    match quality {
        Quality::Uhd4k => "fas fa-trophy",
        Quality::P1080 => "fas fa-gem",
        Quality::P720 => "fas fa-star",
        Quality::P480 => "fas fa-circle",
        Quality::P360 => "fas fa-dot-circle",
    }
}

pub fn period_label(period: MatchPeriod) -> &'static str {
    match period {
        MatchPeriod::FirstHalf => "1st half",
        MatchPeriod::Halftime => "Half-time",
        MatchPeriod::SecondHalf => "2nd half",
        MatchPeriod::ExtraTime => "Extra time",
        MatchPeriod::Penalties => "Penalties",
        MatchPeriod::Unknown => "In play",
    }
}

pub fn render_stream_card(post: &StreamPost, view: &CardView<'_>) -> askama::Result<String> {
    let countdown = view.countdown.cloned().unwrap_or(CountdownState::Pending);
    let cover_href = post
        .cover_image_url
        .as_deref()
        .map(safe_url)
        .filter(|href| href != "#")
        .map(|href| escape_attr(&href));
    let language = Some(post.language.as_str()).filter(|l| !l.is_empty());

    StreamCardTemplate {
        id: &post.id,
        platform_token: post.platform.as_str(),
        platform_icon: platform_icon(post.platform),
        platform_html: highlighted(post.platform_display(), view.query),
        teams_html: highlighted(&post.teams, view.query),
        league_html: highlighted(post.league_display(), view.query),
        period: period_label(post.match_period),
        quality: post.quality.as_str(),
        quality_icon: quality_icon(post.quality),
        language,
        has_commentary: post.has_commentary,
        cover_href,
        author_name: &post.author_name,
        rating_label: view
            .rating
            .filter(|r| r.count > 0)
            .map(|r| format!("{:.1} ({})", r.average, r.count)),
        link_href: escape_attr(&safe_url(&post.link)),
        countdown: countdown.label(),
        expired: countdown.is_expired(),
        favorite: view.favorite,
        can_delete: view.viewer_id.is_some_and(|id| !id.is_empty() && id == post.author_id),
    }
    .render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn post() -> StreamPost {
        StreamPost {
            id: "p1".into(),
            teams: "Real Madrid vs <b>Barça</b>".into(),
            platform: Platform::Youtube,
            other_platform_label: String::new(),
            link: "https://www.youtube.com/watch?v=1".into(),
            match_period: MatchPeriod::SecondHalf,
            league: "laliga".into(),
            other_league_label: String::new(),
            quality: Quality::P1080,
            language: "es".into(),
            has_commentary: true,
            cover_image_url: Some("javascript:alert(1)".into()),
            created_at: Utc::now(),
            server_timestamp: None,
            author_id: "u1".into(),
            author_name: "<i>Ana</i>".into(),
            author_avatar_url: None,
        }
    }

    #[test]
    fn highlights_matches_and_escapes_the_rest() {
        assert_eq!(
            highlighted("Real <Madrid>", "madrid"),
            "Real &lt;<mark class=\"search-highlight\">Madrid</mark>&gt;"
        );
        assert_eq!(highlighted("Sevilla", ""), "Sevilla");
    }

    #[test]
    fn card_never_contains_raw_user_markup() {
        let html = render_stream_card(&post(), &CardView::default()).unwrap();
        assert!(!html.contains("<b>"));
        assert!(!html.contains("<i>Ana"));
        assert!(!html.contains("javascript:"));
        assert!(html.contains("Loading..."));
        assert!(!html.contains("stream-delete"));
    }

    #[test]
    fn card_reflects_the_viewer_state() {
        let countdown = CountdownState::Remaining(Duration::minutes(30));
        let view = CardView {
            query: "real",
            countdown: Some(&countdown),
            favorite: true,
            rating: Some(RatingSummary {
                count: 2,
                average: 4.5,
            }),
            viewer_id: Some("u1"),
        };
        let html = render_stream_card(&post(), &view).unwrap();
        assert!(html.contains("<mark class=\"search-highlight\">Real</mark> Madrid"));
        assert!(html.contains("0h 30m 0s remaining"));
        assert!(html.contains("is-favorite"));
        assert!(html.contains("4.5 (2)"));
        assert!(html.contains("stream-delete"));
        assert!(html.contains("2nd half"));
    }

    #[test]
    fn expired_cards_are_marked() {
        let view = CardView {
            countdown: Some(&CountdownState::Expired),
            ..CardView::default()
        };
        let html = render_stream_card(&post(), &view).unwrap();
        assert!(html.contains("time-remaining expired"));
        assert!(html.contains(">Expired<"));
    }
}
