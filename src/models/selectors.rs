// src/models/selectors.rs

//! CSS selectors for scraping a board's post list.

use serde::{Deserialize, Serialize};

/// CSS selectors for scraping a board's post list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoardSelectors {
    /// Selector for each row in the post list (pinned notices excluded)
    #[serde(default = "default_row_selector")]
    pub row_selector: String,

    /// Selector for the title link within a row
    #[serde(default = "default_title_selector")]
    pub title_selector: String,

    /// Selector for the category tag within a row (empty disables it)
    #[serde(
        default = "default_preface_selector_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub preface_selector: Option<String>,

    /// HTML attribute name for extracting links (usually "href")
    #[serde(default = "default_attr_name")]
    pub attr_name: String,
}

fn default_row_selector() -> String {
    "table.bd_lst tbody.hide_notice tr".to_string()
}

fn default_title_selector() -> String {
    "td.title a:not(.preface):not(.replyNum)".to_string()
}

fn default_preface_selector() -> String {
    "td.title a.preface".to_string()
}

fn default_preface_selector_opt() -> Option<String> {
    Some(default_preface_selector())
}

fn default_attr_name() -> String {
    "href".to_string()
}

impl Default for BoardSelectors {
    fn default() -> Self {
        Self {
            row_selector: default_row_selector(),
            title_selector: default_title_selector(),
            preface_selector: Some(default_preface_selector()),
            attr_name: default_attr_name(),
        }
    }
}

impl BoardSelectors {
    /// Create selectors for a plain table board without category tags.
    pub fn from_pattern(
        row: impl Into<String>,
        title: impl Into<String>,
        attr: impl Into<String>,
    ) -> Self {
        Self {
            row_selector: row.into(),
            title_selector: title.into(),
            preface_selector: None,
            attr_name: attr.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_table_keeps_default_preface() {
        let selectors: BoardSelectors =
            toml::from_str(r#"row_selector = "table.bd_lst tbody tr""#).unwrap();
        assert_eq!(selectors.row_selector, "table.bd_lst tbody tr");
        assert_eq!(selectors.title_selector, default_title_selector());
        assert_eq!(selectors.preface_selector, BoardSelectors::default().preface_selector);
    }

    #[test]
    fn test_from_pattern_has_no_preface() {
        let selectors = BoardSelectors::from_pattern("ul li", "a", "href");
        assert_eq!(selectors.preface_selector, None);
    }
}
