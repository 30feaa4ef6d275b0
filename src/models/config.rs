//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{BoardSelectors, IdentityStrategy};

/// Environment variable overriding `telegram.bot_token`.
pub const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";

/// Environment variable overriding `telegram.chat_id`.
pub const ENV_CHAT_ID: &str = "TELEGRAM_CHAT_ID";

/// Longest accepted poll interval (one week).
pub const MAX_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Keywords matched against post titles, in priority order
    #[serde(default = "defaults::keywords")]
    pub keywords: Vec<String>,

    /// HTTP client settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Board location and scraping rules
    #[serde(default)]
    pub board: BoardConfig,

    /// Telegram bot settings
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Polling and retry timing
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Notification message layout
    #[serde(default)]
    pub message: MessageConfig,

    /// How posts are recognised between polls
    #[serde(default)]
    pub tracking: TrackingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Override Telegram credentials from the environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(ENV_BOT_TOKEN).ok(),
            std::env::var(ENV_CHAT_ID).ok(),
        );
    }

    fn apply_overrides(&mut self, bot_token: Option<String>, chat_id: Option<String>) {
        if let Some(token) = bot_token.filter(|t| !t.trim().is_empty()) {
            self.telegram.bot_token = token;
        }
        if let Some(chat) = chat_id.filter(|c| !c.trim().is_empty()) {
            self.telegram.chat_id = chat;
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        url::Url::parse(&self.board.url)
            .map_err(|e| AppError::validation(format!("board.url is invalid: {e}")))?;
        if self.board.max_posts == 0 {
            return Err(AppError::validation("board.max_posts must be > 0"));
        }
        if self.keywords.is_empty() {
            return Err(AppError::validation("No keywords defined"));
        }
        if self.keywords.iter().any(|k| k.is_empty()) {
            return Err(AppError::validation("keywords must not contain empty strings"));
        }
        if self.schedule.interval_minutes == 0 {
            return Err(AppError::validation("schedule.interval_minutes must be > 0"));
        }
        if self.schedule.interval_minutes > MAX_INTERVAL_MINUTES {
            return Err(AppError::validation(format!(
                "schedule.interval_minutes must be <= {MAX_INTERVAL_MINUTES}"
            )));
        }
        if self.schedule.max_retries == 0 {
            return Err(AppError::validation("schedule.max_retries must be > 0"));
        }
        if self.message.template.trim().is_empty() {
            return Err(AppError::validation("message.template is empty"));
        }
        Ok(())
    }

    /// Check that Telegram credentials are present.
    pub fn require_credentials(&self) -> Result<()> {
        if self.telegram.bot_token.trim().is_empty() {
            return Err(AppError::config(format!(
                "telegram.bot_token is empty (set it in the config or via {ENV_BOT_TOKEN})"
            )));
        }
        if self.telegram.chat_id.trim().is_empty() {
            return Err(AppError::config(format!(
                "telegram.chat_id is empty (set it in the config or via {ENV_CHAT_ID})"
            )));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keywords: defaults::keywords(),
            crawler: CrawlerConfig::default(),
            board: BoardConfig::default(),
            telegram: TelegramConfig::default(),
            schedule: ScheduleConfig::default(),
            message: MessageConfig::default(),
            tracking: TrackingConfig::default(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Board location and scraping rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    /// URL of the board's post list
    #[serde(default = "defaults::board_url")]
    pub url: String,

    /// CSS selectors for the post list
    #[serde(default)]
    pub selectors: BoardSelectors,

    /// Maximum number of posts taken from one page
    #[serde(default = "defaults::max_posts")]
    pub max_posts: usize,

    /// Titles shorter than this (in characters) are skipped
    #[serde(default = "defaults::min_title_chars")]
    pub min_title_chars: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            url: defaults::board_url(),
            selectors: BoardSelectors::default(),
            max_posts: defaults::max_posts(),
            min_title_chars: defaults::min_title_chars(),
        }
    }
}

/// Telegram bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather
    #[serde(default)]
    pub bot_token: String,

    /// Destination chat identifier
    #[serde(default)]
    pub chat_id: String,

    /// Bot API base URL
    #[serde(default = "defaults::api_base")]
    pub api_base: String,

    /// Suppress link previews in sent messages
    #[serde(default)]
    pub disable_web_page_preview: bool,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            api_base: defaults::api_base(),
            disable_web_page_preview: false,
        }
    }
}

/// Polling and retry timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Minutes between polls
    #[serde(default = "defaults::interval_minutes")]
    pub interval_minutes: u64,

    /// Attempts per poll before giving up until the next tick
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Seconds to wait between failed attempts
    #[serde(default = "defaults::retry_interval")]
    pub retry_interval_secs: u64,
}

impl ScheduleConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.saturating_mul(60))
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_minutes: defaults::interval_minutes(),
            max_retries: defaults::max_retries(),
            retry_interval_secs: defaults::retry_interval(),
        }
    }
}

/// Notification message layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageConfig {
    /// Message template, see `Post::format` for placeholders
    #[serde(default = "defaults::template")]
    pub template: String,

    /// Longest title (in graphemes) put into a message, 0 for no limit
    #[serde(default = "defaults::max_title_chars")]
    pub max_title_chars: usize,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            template: defaults::template(),
            max_title_chars: defaults::max_title_chars(),
        }
    }
}

/// How posts are recognised between polls.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TrackingConfig {
    #[serde(default)]
    pub strategy: IdentityStrategy,
}

mod defaults {
    pub fn keywords() -> Vec<String> {
        vec!["도둑들".into(), "밤식".into(), "범식".into()]
    }

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".into()
    }
    pub fn timeout() -> u64 {
        20
    }

    // Board defaults
    pub fn board_url() -> String {
        "https://theqoo.net/bl".into()
    }
    pub fn max_posts() -> usize {
        30
    }
    pub fn min_title_chars() -> usize {
        2
    }

    // Telegram defaults
    pub fn api_base() -> String {
        "https://api.telegram.org".into()
    }

    // Schedule defaults
    pub fn interval_minutes() -> u64 {
        5
    }
    pub fn max_retries() -> u32 {
        3
    }
    pub fn retry_interval() -> u64 {
        60
    }

    // Message defaults
    pub fn template() -> String {
        "새로운 글 알림!\n\n제목: {title}\n링크: {link}".into()
    }
    pub fn max_title_chars() -> usize {
        200
    }
}
