//! Invariants a `StreamPost` must satisfy both on submission and when it
//! arrives in a snapshot.

use url::Url;

use crate::errors::{AppError, Result};
use crate::models::{Platform, StreamPost, OTHER_LEAGUE};

/// Hosts accepted for each platform. A link matches when its host equals an
/// entry or is a subdomain of it. `Other` accepts any host.
fn allowed_hosts(platform: Platform) -> &'static [&'static str] {
    match platform {
        Platform::Youtube => &["youtube.com", "youtu.be"],
        Platform::Instagram => &["instagram.com"],
        Platform::Tiktok => &["tiktok.com"],
        Platform::Facebook => &["facebook.com", "fb.watch", "fb.com"],
        Platform::Twitch => &["twitch.tv"],
        Platform::Kick => &["kick.com"],
        Platform::Other => &[],
    }
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Checks that `link` is an absolute http(s) URL hosted where `platform`
/// says it is.
pub fn validate_link(platform: Platform, link: &str) -> Result<Url> {
    let url = Url::parse(link.trim())
        .map_err(|_| AppError::validation("please enter a valid URL"))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::validation("links must use http or https"));
    }

    let host = url
        .host_str()
        .ok_or_else(|| AppError::validation("link has no host"))?
        .to_ascii_lowercase();

    let allowed = allowed_hosts(platform);
    if !allowed.is_empty() && !allowed.iter().any(|d| host_matches(&host, d)) {
        return Err(AppError::validation(format!(
            "link host '{host}' does not belong to {platform}"
        )));
    }

    Ok(url)
}

/// Invariants shared by submission and snapshot decoding.
pub fn validate_post(post: &StreamPost) -> Result<()> {
    if post.platform == Platform::Other && post.other_platform_label.trim().is_empty() {
        return Err(AppError::validation(
            "platform 'other' requires a platform name",
        ));
    }
    if post.league == OTHER_LEAGUE && post.other_league_label.trim().is_empty() {
        return Err(AppError::validation("league 'other' requires a league name"));
    }
    validate_link(post.platform, &post.link)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_platform_hosts_and_subdomains() {
        assert!(validate_link(Platform::Youtube, "https://www.youtube.com/watch?v=x").is_ok());
        assert!(validate_link(Platform::Youtube, "https://youtu.be/abc").is_ok());
        assert!(validate_link(Platform::Twitch, "https://m.twitch.tv/channel").is_ok());
        assert!(validate_link(Platform::Facebook, "https://fb.watch/xyz").is_ok());
    }

    #[test]
    fn rejects_lookalike_hosts() {
        assert!(validate_link(Platform::Youtube, "https://notyoutube.com/x").is_err());
        assert!(validate_link(Platform::Kick, "https://kick.com.evil.io/x").is_err());
    }

    #[test]
    fn rejects_non_http_schemes() {
        assert!(validate_link(Platform::Other, "javascript:alert(1)").is_err());
        assert!(validate_link(Platform::Other, "ftp://files.example.com/a").is_err());
        assert!(validate_link(Platform::Other, "not a url").is_err());
    }

    #[test]
    fn other_platform_accepts_any_host() {
        assert!(validate_link(Platform::Other, "https://rumble.com/live").is_ok());
    }
}
