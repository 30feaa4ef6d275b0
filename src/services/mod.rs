//! Service layer for the watcher application.
//!
//! This module contains the I/O collaborators around the detection core:
//! - Board fetching (`BoardFetcher`, `HtmlBoardFetcher`)
//! - Message dispatch (`Notifier`, `TelegramNotifier`, `DryRunNotifier`)

mod fetcher;
mod notifier;

pub use fetcher::{BoardFetcher, HtmlBoardFetcher};
pub use notifier::{DryRunNotifier, Notifier, TelegramNotifier};
