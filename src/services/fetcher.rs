// src/services/fetcher.rs

//! Board fetcher service.
//!
//! Fetches the board's post list and turns each row into a `Post` using the
//! configured CSS selectors. Posts come back in the board's own order, newest
//! first.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{BoardConfig, Post};
use crate::utils::http::fetch_text;
use crate::utils::{extract_post_id, normalize_whitespace, resolve_url};

/// Source of board posts.
///
/// Implementations never fail: transport and markup problems are logged and
/// reported as an empty list.
#[async_trait]
pub trait BoardFetcher: Send + Sync {
    /// Fetch the current page of posts, newest first.
    async fn fetch(&self) -> Vec<Post>;

    /// Where the posts come from, for logging.
    fn source(&self) -> &str;
}

/// Fetches posts from an HTML board page.
pub struct HtmlBoardFetcher {
    client: Client,
    board: BoardConfig,
    base_url: Url,
    row_sel: Selector,
    title_sel: Selector,
    preface_sel: Option<Selector>,
}

impl HtmlBoardFetcher {
    /// Create a fetcher for the given board, parsing its selectors up front.
    pub fn new(client: Client, board: BoardConfig) -> Result<Self> {
        let base_url = Url::parse(&board.url)?;
        let row_sel = parse_selector(&board.selectors.row_selector)?;
        let title_sel = parse_selector(&board.selectors.title_selector)?;
        let preface_sel = board
            .selectors
            .preface_selector
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(parse_selector)
            .transpose()?;

        Ok(Self {
            client,
            board,
            base_url,
            row_sel,
            title_sel,
            preface_sel,
        })
    }

    /// Parse a board page into posts, in page order.
    pub fn parse_posts(&self, html: &str) -> Vec<Post> {
        let document = Html::parse_document(html);

        document
            .select(&self.row_sel)
            .filter_map(|row| self.parse_row(&row))
            .take(self.board.max_posts)
            .collect()
    }

    fn parse_row(&self, row: &ElementRef) -> Option<Post> {
        let title_elem = row.select(&self.title_sel).next()?;

        let raw_title: String = title_elem.text().collect();
        let title = normalize_whitespace(&raw_title);
        if title.is_empty() || title.chars().count() < self.board.min_title_chars {
            return None;
        }

        let href = title_elem
            .value()
            .attr(&self.board.selectors.attr_name)?
            .trim();
        if href.is_empty() {
            return None;
        }
        let link = resolve_url(&self.base_url, href);

        let mut post = Post::new(title, link);
        if let Some(id) = extract_post_id(&post.link) {
            post = post.with_id(id);
        }

        let preface = self
            .preface_sel
            .as_ref()
            .and_then(|sel| row.select(sel).next())
            .map(|el| normalize_whitespace(&el.text().collect::<String>()))
            .filter(|p| !p.is_empty());
        if let Some(preface) = preface {
            post = post.with_preface(preface);
        }

        Some(post)
    }
}

#[async_trait]
impl BoardFetcher for HtmlBoardFetcher {
    async fn fetch(&self) -> Vec<Post> {
        match fetch_text(&self.client, &self.board.url).await {
            Ok(html) => {
                let posts = self.parse_posts(&html);
                if posts.is_empty() {
                    log::warn!(
                        "No posts found on {}. The page structure may have changed.",
                        self.board.url
                    );
                } else {
                    log::debug!("Parsed {} posts from {}", posts.len(), self.board.url);
                }
                posts
            }
            Err(e) => {
                log::warn!("Failed to fetch board {}: {}", self.board.url, e);
                Vec::new()
            }
        }
    }

    fn source(&self) -> &str {
        &self.board.url
    }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
