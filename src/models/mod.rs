// src/models/mod.rs

//! Domain models for the watcher application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod post;
mod selectors;
mod watermark;

// Re-export all public types
pub use config::{
    BoardConfig, Config, CrawlerConfig, MessageConfig, ScheduleConfig, TelegramConfig,
    TrackingConfig,
};
pub use post::Post;
pub use selectors::BoardSelectors;
pub use watermark::{IdentityStrategy, Watermark};
