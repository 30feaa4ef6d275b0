//! Utility functions and helpers.

pub mod http;

use unicode_segmentation::UnicodeSegmentation;
use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Shorten `text` to at most `max` graphemes, appending `…` when cut.
///
/// `max == 0` means no limit.
pub fn truncate_graphemes(text: &str, max: usize) -> String {
    if max == 0 {
        return text.to_string();
    }

    let mut graphemes = text.graphemes(true);
    let head: String = graphemes.by_ref().take(max).collect();
    if graphemes.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}

/// Extract a stable post identifier from a URL.
///
/// Looks at well-known query keys first (`document_srl`, `no`, ...), then
/// falls back to the digits of the last path segment (`/bl/3012345678`).
pub fn extract_post_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;

    for (key, value) in parsed.query_pairs() {
        if value.is_empty() {
            continue;
        }
        let key_lower = key.to_lowercase();
        if matches!(
            key_lower.as_str(),
            "document_srl" | "srl" | "articleno" | "article_no" | "seq" | "no" | "id"
        ) {
            return Some(value.to_string());
        }
    }

    let last = parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())?;
    if !last.is_empty() && last.chars().all(|c| c.is_ascii_digit()) {
        return Some(last.to_string());
    }

    None
}
