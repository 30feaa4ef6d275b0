// src/pipeline/detect.rs

//! New-post detection.
//!
//! Works out which fetched posts appeared since the last poll and which of
//! those match a keyword. Boards list posts newest first; detection runs
//! oldest to newest so matches come out in the order they were posted.

use crate::error::{AppError, Result};
use crate::models::{IdentityStrategy, Post};

/// A post that matched a keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub post: Post,
    /// The first configured keyword found in the title
    pub keyword: String,
}

/// Result of comparing a fetch against the watermark.
#[derive(Debug, Clone, Default)]
pub struct Detection {
    /// Posts newer than the watermark, oldest first
    pub candidates: Vec<Post>,
    /// Candidates whose title matched a keyword, oldest first
    pub matches: Vec<Match>,
    /// Key the watermark should move to
    pub new_watermark: String,
}

impl Detection {
    pub fn has_matches(&self) -> bool {
        !self.matches.is_empty()
    }
}

/// Find the first keyword contained in `title` (case-sensitive).
pub fn match_keyword<'a>(title: &str, keywords: &'a [String]) -> Option<&'a str> {
    keywords
        .iter()
        .map(String::as_str)
        .find(|keyword| title.contains(keyword))
}

/// Compare `fetched` (newest first) against `watermark`.
///
/// - An empty fetch is `AppError::EmptyFetch`, not "nothing new".
/// - Candidates start after the first post whose key equals the watermark.
///   If the watermark is empty or no longer on the page, every fetched post
///   is a candidate.
/// - The new watermark is the key of the last matched post, or of the newest
///   fetched post when nothing matched.
pub fn detect(
    fetched: &[Post],
    watermark: &str,
    keywords: &[String],
    strategy: IdentityStrategy,
) -> Result<Detection> {
    if fetched.is_empty() {
        return Err(AppError::EmptyFetch);
    }

    let chrono: Vec<&Post> = fetched.iter().rev().collect();

    let start = if watermark.is_empty() {
        0
    } else {
        chrono
            .iter()
            .position(|post| strategy.key(post) == watermark)
            .map_or(0, |idx| idx + 1)
    };

    let candidates: Vec<Post> = chrono[start..].iter().map(|post| (*post).clone()).collect();

    let matches: Vec<Match> = candidates
        .iter()
        .filter_map(|post| {
            match_keyword(&post.title, keywords).map(|keyword| Match {
                post: post.clone(),
                keyword: keyword.to_string(),
            })
        })
        .collect();

    let new_watermark = match matches.last() {
        Some(last) => strategy.key(&last.post).to_string(),
        // fetched[0] is the newest post on the page
        None => strategy.key(&fetched[0]).to_string(),
    };

    Ok(Detection {
        candidates,
        matches,
        new_watermark,
    })
}
