// src/pipeline/process.rs

//! One poll cycle: fetch, detect, dispatch, move the watermark.

use std::sync::Arc;

use crate::error::Result;
use crate::models::{Config, IdentityStrategy, Post, Watermark};
use crate::pipeline::detect::detect;
use crate::services::{BoardFetcher, Notifier};

/// What to look for and how to word the messages.
#[derive(Debug, Clone)]
pub struct WatchRules {
    pub keywords: Vec<String>,
    pub strategy: IdentityStrategy,
    pub template: String,
    pub max_title_chars: usize,
}

impl WatchRules {
    pub fn from_config(config: &Config) -> Self {
        Self {
            keywords: config.keywords.clone(),
            strategy: config.tracking.strategy,
            template: config.message.template.clone(),
            max_title_chars: config.message.max_title_chars,
        }
    }
}

/// Summary of a successful cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    /// Number of posts on the fetched page
    pub fetched: usize,
    /// Number of posts newer than the previous watermark
    pub candidates: usize,
    /// Posts a notification was attempted for, oldest first
    pub notified: Vec<Post>,
    /// Notifications the notifier rejected
    pub failed_deliveries: usize,
}

/// Ties a fetcher and a notifier together under one set of rules.
#[derive(Clone)]
pub struct Watcher {
    fetcher: Arc<dyn BoardFetcher>,
    notifier: Arc<dyn Notifier>,
    rules: WatchRules,
}

impl Watcher {
    pub fn new(
        fetcher: Arc<dyn BoardFetcher>,
        notifier: Arc<dyn Notifier>,
        rules: WatchRules,
    ) -> Self {
        Self {
            fetcher,
            notifier,
            rules,
        }
    }

    pub fn rules(&self) -> &WatchRules {
        &self.rules
    }

    /// Fetch the board and process whatever came back.
    pub async fn check(&self, watermark: &mut Watermark) -> Result<CycleReport> {
        log::debug!("Checking {}", self.fetcher.source());
        let posts = self.fetcher.fetch().await;
        self.process(&posts, watermark).await
    }

    /// Notify for new matching posts and move the watermark.
    ///
    /// Fails only on an empty fetch, leaving the watermark untouched.
    /// Delivery failures are logged and counted; they never stop the
    /// remaining messages or the watermark update.
    pub async fn process(&self, fetched: &[Post], watermark: &mut Watermark) -> Result<CycleReport> {
        let detection = detect(
            fetched,
            watermark.key(),
            &self.rules.keywords,
            self.rules.strategy,
        )?;

        let mut report = CycleReport {
            fetched: fetched.len(),
            candidates: detection.candidates.len(),
            ..CycleReport::default()
        };

        for found in detection.matches {
            let text = found.post.format(
                &self.rules.template,
                &found.keyword,
                self.rules.max_title_chars,
            );

            match self.notifier.send(&text).await {
                Ok(()) => log::info!(
                    "Notified via {}: {} ({})",
                    self.notifier.name(),
                    found.post.title,
                    found.keyword
                ),
                Err(e) => {
                    report.failed_deliveries += 1;
                    log::warn!(
                        "Failed to notify via {} for '{}': {}",
                        self.notifier.name(),
                        found.post.title,
                        e
                    );
                }
            }
            report.notified.push(found.post);
        }

        watermark.advance(detection.new_watermark);

        log::info!(
            "Checked {} posts: {} new, {} notified",
            report.fetched,
            report.candidates,
            report.notified.len()
        );

        Ok(report)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::error::AppError;

    /// Fetcher returning scripted pages, then repeating the last one.
    pub(crate) struct ScriptedFetcher {
        pages: Mutex<VecDeque<Vec<Post>>>,
        last: Mutex<Vec<Post>>,
        pub calls: AtomicUsize,
    }

    impl ScriptedFetcher {
        pub(crate) fn new(pages: Vec<Vec<Post>>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
                last: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BoardFetcher for ScriptedFetcher {
        async fn fetch(&self) -> Vec<Post> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.pages.lock().unwrap().pop_front();
            let mut last = self.last.lock().unwrap();
            if let Some(page) = next {
                *last = page;
            }
            last.clone()
        }

        fn source(&self) -> &str {
            "scripted"
        }
    }

    /// Notifier that records every message and can reject some of them.
    #[derive(Default)]
    pub(crate) struct RecordingNotifier {
        pub sent: Mutex<Vec<String>>,
        pub reject_containing: Option<String>,
    }

    impl RecordingNotifier {
        pub(crate) fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, text: &str) -> Result<()> {
            self.sent.lock().unwrap().push(text.to_string());
            match &self.reject_containing {
                Some(needle) if text.contains(needle.as_str()) => {
                    Err(AppError::notify("chat not found"))
                }
                _ => Ok(()),
            }
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    pub(crate) fn rules(keywords: &[&str]) -> WatchRules {
        WatchRules {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            strategy: IdentityStrategy::ByTitle,
            template: "{title}|{link}".to_string(),
            max_title_chars: 0,
        }
    }

    fn scenario_page() -> Vec<Post> {
        vec![
            Post::new("오늘 범식 목격", "l3"),
            Post::new("날씨", "l2"),
            Post::new("공지", "l1"),
        ]
    }

    #[tokio::test]
    async fn test_process_end_to_end() {
        let notifier = Arc::new(RecordingNotifier::default());
        let watcher = Watcher::new(
            Arc::new(ScriptedFetcher::new(vec![])),
            notifier.clone(),
            rules(&["범식"]),
        );
        let mut watermark = Watermark::new();

        let report = watcher.process(&scenario_page(), &mut watermark).await.unwrap();

        assert_eq!(report.fetched, 3);
        assert_eq!(report.candidates, 3);
        assert_eq!(report.notified.len(), 1);
        assert_eq!(notifier.sent(), vec!["오늘 범식 목격|l3".to_string()]);
        assert_eq!(watermark.key(), "오늘 범식 목격");
    }

    #[tokio::test]
    async fn test_process_twice_sends_nothing_new() {
        let notifier = Arc::new(RecordingNotifier::default());
        let watcher = Watcher::new(
            Arc::new(ScriptedFetcher::new(vec![])),
            notifier.clone(),
            rules(&["범식"]),
        );
        let mut watermark = Watermark::new();

        watcher.process(&scenario_page(), &mut watermark).await.unwrap();
        let second = watcher.process(&scenario_page(), &mut watermark).await.unwrap();

        assert!(second.notified.is_empty());
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_fetch_leaves_watermark() {
        let notifier = Arc::new(RecordingNotifier::default());
        let watcher = Watcher::new(
            Arc::new(ScriptedFetcher::new(vec![])),
            notifier.clone(),
            rules(&["범식"]),
        );
        let mut watermark = Watermark::new();
        watermark.advance("날씨");

        let err = watcher.check(&mut watermark).await.unwrap_err();

        assert!(err.is_empty_fetch());
        assert_eq!(watermark.key(), "날씨");
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_failed_delivery_does_not_stop_batch() {
        let notifier = Arc::new(RecordingNotifier {
            reject_containing: Some("첫".to_string()),
            ..RecordingNotifier::default()
        });
        let watcher = Watcher::new(
            Arc::new(ScriptedFetcher::new(vec![])),
            notifier.clone(),
            rules(&["범식"]),
        );
        let page = vec![Post::new("범식 둘째", "l2"), Post::new("범식 첫째", "l1")];
        let mut watermark = Watermark::new();

        let report = watcher.process(&page, &mut watermark).await.unwrap();

        assert_eq!(notifier.sent().len(), 2);
        assert_eq!(report.failed_deliveries, 1);
        assert_eq!(report.notified.len(), 2);
        assert_eq!(watermark.key(), "범식 둘째");
    }

    #[tokio::test]
    async fn test_check_uses_fetcher() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![scenario_page()]));
        let watcher = Watcher::new(
            fetcher.clone(),
            Arc::new(RecordingNotifier::default()),
            rules(&["없는 키워드"]),
        );
        let mut watermark = Watermark::new();

        let report = watcher.check(&mut watermark).await.unwrap();

        assert_eq!(fetcher.calls(), 1);
        assert!(report.notified.is_empty());
        assert_eq!(watermark.key(), "오늘 범식 목격");
    }

    #[test]
    fn test_rules_from_config() {
        let rules = WatchRules::from_config(&Config::default());
        assert_eq!(rules.keywords.len(), 3);
        assert_eq!(rules.strategy, IdentityStrategy::ByTitle);
    }
}
