//! Case-insensitive substring matching and highlight segmentation.
//!
//! Matching compares char by char with full Unicode lowercasing, so byte
//! offsets always refer to the original text even when lowercasing would
//! change its length.

fn chars_eq_ci(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

/// Byte length of the prefix of `text` matching `query`, if any.
fn prefix_match_len(text: &str, query: &str) -> Option<usize> {
    let mut text_chars = text.char_indices();
    let mut end = 0;
    for q in query.chars() {
        let (idx, t) = text_chars.next()?;
        if !chars_eq_ci(t, q) {
            return None;
        }
        end = idx + t.len_utf8();
    }
    Some(end)
}

/// First case-insensitive occurrence of `query` in `text`, as a byte range.
pub fn find_ci(text: &str, query: &str) -> Option<(usize, usize)> {
    if query.is_empty() {
        return None;
    }
    text.char_indices()
        .find_map(|(start, _)| prefix_match_len(&text[start..], query).map(|len| (start, start + len)))
}

pub fn contains_ci(text: &str, query: &str) -> bool {
    query.is_empty() || find_ci(text, query).is_some()
}

/// A piece of display text, either plain or matching the search query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Plain(&'a str),
    Match(&'a str),
}

impl<'a> Segment<'a> {
    pub fn text(&self) -> &'a str {
        match self {
            Segment::Plain(s) | Segment::Match(s) => s,
        }
    }
}

/// Splits `text` around every case-insensitive occurrence of `query`.
/// Concatenating the segments gives back `text` unchanged.
pub fn highlight<'a>(text: &'a str, query: &str) -> Vec<Segment<'a>> {
    let query = query.trim();
    let mut segments = Vec::new();
    let mut pos = 0;

    while let Some((start, end)) = find_ci(&text[pos..], query) {
        if start > 0 {
            segments.push(Segment::Plain(&text[pos..pos + start]));
        }
        segments.push(Segment::Match(&text[pos + start..pos + end]));
        pos += end;
    }
    if pos < text.len() || segments.is_empty() {
        segments.push(Segment::Plain(&text[pos..]));
    }
    segments
}
