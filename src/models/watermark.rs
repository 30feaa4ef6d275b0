//! Watermark state and post identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Post;

/// How posts are identified across polls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityStrategy {
    /// Compare posts by title.
    #[default]
    ByTitle,
    /// Compare posts by the id taken from the link, falling back to the link itself.
    ByStableId,
}

impl IdentityStrategy {
    /// The key used to recognise `post` across polls.
    pub fn key<'a>(&self, post: &'a Post) -> &'a str {
        match self {
            IdentityStrategy::ByTitle => &post.title,
            IdentityStrategy::ByStableId => post.id.as_deref().unwrap_or(&post.link),
        }
    }
}

/// The last post seen by the watcher.
///
/// Lives in memory for the lifetime of the process and starts out empty.
#[derive(Debug, Clone, Default)]
pub struct Watermark {
    last_key: String,
    updated_at: Option<DateTime<Utc>>,
}

impl Watermark {
    /// An empty watermark.
    pub fn new() -> Self {
        Self::default()
    }

    /// Key of the last seen post, empty if nothing was seen yet.
    pub fn key(&self) -> &str {
        &self.last_key
    }

    pub fn is_empty(&self) -> bool {
        self.last_key.is_empty()
    }

    /// When the watermark last moved.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Move the watermark to a new key.
    pub fn advance(&mut self, key: impl Into<String>) {
        self.last_key = key.into();
        self.updated_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_watermark_is_empty() {
        let watermark = Watermark::new();
        assert!(watermark.is_empty());
        assert_eq!(watermark.key(), "");
        assert!(watermark.updated_at().is_none());
    }

    #[test]
    fn test_advance() {
        let mut watermark = Watermark::new();
        watermark.advance("날씨");
        assert_eq!(watermark.key(), "날씨");
        assert!(watermark.updated_at().is_some());
    }

    #[test]
    fn test_strategy_keys() {
        let post = Post::new("제목", "https://theqoo.net/bl/42").with_id("42");
        assert_eq!(IdentityStrategy::ByTitle.key(&post), "제목");
        assert_eq!(IdentityStrategy::ByStableId.key(&post), "42");

        let no_id = Post::new("제목", "https://theqoo.net/bl/x");
        assert_eq!(
            IdentityStrategy::ByStableId.key(&no_id),
            "https://theqoo.net/bl/x"
        );
    }

    #[test]
    fn test_strategy_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            strategy: IdentityStrategy,
        }
        let parsed: Wrapper = toml::from_str("strategy = \"by_stable_id\"").unwrap();
        assert_eq!(parsed.strategy, IdentityStrategy::ByStableId);
    }
}
