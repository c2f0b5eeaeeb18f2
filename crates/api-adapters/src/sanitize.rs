//! Escaping for user-supplied text before it reaches markup.
//!
//! Stored content is kept exactly as typed; everything goes through here at
//! render time.

use url::Url;

/// Escapes text for element content (`&`, `<`, `>`, quotes and `/`).
pub fn escape_text(raw: &str) -> String {
    html_escape::encode_safe(raw).into_owned()
}

/// Escapes a value placed inside a double-quoted attribute.
pub fn escape_attr(raw: &str) -> String {
    html_escape::encode_double_quoted_attribute(raw).into_owned()
}

/// Returns `raw` if it is an absolute http(s) URL, otherwise `#`, so
/// `javascript:` and `data:` links never become clickable.
pub fn safe_url(raw: &str) -> String {
    match Url::parse(raw.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => {
            url.to_string()
        }
        _ => "#".to_string(),
    }
}
