//! Post data structure.

use serde::{Deserialize, Serialize};

use crate::utils::truncate_graphemes;

/// A post fetched from a board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    /// Post title (without the category tag)
    pub title: String,

    /// Full URL to the post
    pub link: String,

    /// Stable identifier taken from the link, if one could be found
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Category tag shown in front of the title (e.g. "잡담")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preface: Option<String>,
}

impl Post {
    /// Create a post with only a title and a link.
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            id: None,
            preface: None,
        }
    }

    /// Attach a stable identifier.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Attach a category tag.
    pub fn with_preface(mut self, preface: impl Into<String>) -> Self {
        self.preface = Some(preface.into());
        self
    }

    /// Title with the category tag in front, as shown on the board.
    pub fn display_title(&self) -> String {
        match self.preface.as_deref() {
            Some(preface) if !preface.is_empty() => format!("[{}] {}", preface, self.title),
            _ => self.title.clone(),
        }
    }

    /// Format post for a message using a template.
    ///
    /// Supported placeholders:
    /// - `{title}`, `{display_title}`, `{link}`, `{preface}`, `{keyword}`
    ///
    /// Titles longer than `max_title_chars` graphemes are shortened with `…`.
    /// A limit of 0 disables truncation.
    pub fn format(&self, template: &str, keyword: &str, max_title_chars: usize) -> String {
        let title = truncate_graphemes(&self.title, max_title_chars);
        let display_title = truncate_graphemes(&self.display_title(), max_title_chars);

        template
            .replace("{display_title}", &display_title)
            .replace("{title}", &title)
            .replace("{link}", &self.link)
            .replace("{preface}", self.preface.as_deref().unwrap_or(""))
            .replace("{keyword}", keyword)
    }
}
