// src/pipeline/schedule.rs

//! Periodic polling.
//!
//! A timer task pushes ticks into a one-slot queue and a single worker drains
//! it, running one retried cycle per tick. The worker owns the watermark.
//! Ticks that arrive while a cycle is still running are dropped, so cycles
//! never overlap and never pile up: the next cycle waits for the next tick
//! after the slow one finishes.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};
use crate::models::Watermark;
use crate::pipeline::process::Watcher;
use crate::pipeline::retry::{RetryOutcome, RetryPolicy, run_with_retry};

/// A request to run one poll cycle.
#[derive(Debug, Clone, Copy)]
pub struct Tick {
    pub seq: u64,
    pub at: DateTime<Utc>,
}

/// Drives a `Watcher` at a fixed interval until cancelled.
pub struct Scheduler {
    watcher: Watcher,
    policy: RetryPolicy,
    interval: Duration,
    cancel: CancellationToken,
}

impl Scheduler {
    pub fn new(
        watcher: Watcher,
        policy: RetryPolicy,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Result<Self> {
        if interval.is_zero() {
            return Err(AppError::config("poll interval must be > 0"));
        }
        Ok(Self {
            watcher,
            policy,
            interval,
            cancel,
        })
    }

    /// Run until cancelled. The first cycle starts immediately.
    ///
    /// Returns the watermark as it stood when the scheduler stopped.
    pub async fn run(self) -> Watermark {
        let (tx, mut rx) = mpsc::channel::<Tick>(1);
        let timer = tokio::spawn(run_timer(self.interval, tx, self.cancel.clone()));

        log::info!(
            "Polling every {}s (up to {} attempts, {}s apart)",
            self.interval.as_secs(),
            self.policy.max_attempts,
            self.policy.interval.as_secs()
        );

        let mut watermark = Watermark::new();
        loop {
            let tick = tokio::select! {
                _ = self.cancel.cancelled() => break,
                tick = rx.recv() => match tick {
                    Some(tick) => tick,
                    None => break,
                },
            };

            log::debug!("Tick #{} at {}", tick.seq, tick.at.to_rfc3339());
            let outcome =
                run_with_retry(&self.watcher, &mut watermark, &self.policy, &self.cancel).await;
            if let RetryOutcome::Succeeded { report, attempts } = &outcome {
                if report.failed_deliveries > 0 || *attempts > 1 {
                    log::info!(
                        "Cycle #{} done after {} attempt(s), {} delivery failure(s)",
                        tick.seq,
                        attempts,
                        report.failed_deliveries
                    );
                }
            }

            let mut skipped = 0;
            while rx.try_recv().is_ok() {
                skipped += 1;
            }
            if skipped > 0 {
                log::debug!(
                    "Dropped {} tick(s) that arrived during cycle #{}",
                    skipped,
                    tick.seq
                );
            }
        }

        if let Err(e) = timer.await {
            log::warn!("Timer task ended abnormally: {}", e);
        }
        log::info!("Scheduler stopped");
        watermark
    }
}

async fn run_timer(period: Duration, tx: mpsc::Sender<Tick>, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut seq = 0;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                seq += 1;
                match tx.try_send(Tick { seq, at: Utc::now() }) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        log::debug!("Previous cycle still running, skipping tick #{}", seq);
                    }
                    Err(TrySendError::Closed(_)) => break,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use tokio::time::Instant;

    use super::*;
    use crate::models::Post;
    use crate::pipeline::process::tests::{RecordingNotifier, ScriptedFetcher, rules};
    use crate::services::BoardFetcher;

    /// Fetcher that takes `delay` to answer and records when each fetch began.
    struct SlowFetcher {
        origin: Instant,
        delay: Duration,
        started: Mutex<Vec<u64>>,
    }

    impl SlowFetcher {
        fn new(delay: Duration) -> Self {
            Self {
                origin: Instant::now(),
                delay,
                started: Mutex::new(Vec::new()),
            }
        }

        fn started(&self) -> Vec<u64> {
            self.started.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BoardFetcher for SlowFetcher {
        async fn fetch(&self) -> Vec<Post> {
            self.started
                .lock()
                .unwrap()
                .push(self.origin.elapsed().as_secs());
            tokio::time::sleep(self.delay).await;
            vec![Post::new("날씨", "l1")]
        }

        fn source(&self) -> &str {
            "slow"
        }
    }

    #[test]
    fn test_zero_interval_rejected() {
        let watcher = Watcher::new(
            Arc::new(ScriptedFetcher::new(vec![])),
            Arc::new(RecordingNotifier::default()),
            rules(&["범식"]),
        );
        let result = Scheduler::new(
            watcher,
            RetryPolicy::new(3, Duration::from_secs(60)),
            Duration::ZERO,
            CancellationToken::new(),
        );
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_on_interval_until_cancelled() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![
            vec![Post::new("날씨", "l1")],
            vec![Post::new("범식 등장", "l2"), Post::new("날씨", "l1")],
            vec![
                Post::new("또 범식", "l3"),
                Post::new("범식 등장", "l2"),
                Post::new("날씨", "l1"),
            ],
        ]));
        let notifier = Arc::new(RecordingNotifier::default());
        let watcher = Watcher::new(fetcher.clone(), notifier.clone(), rules(&["범식"]));
        let cancel = CancellationToken::new();

        let scheduler = Scheduler::new(
            watcher,
            RetryPolicy::new(3, Duration::from_secs(60)),
            Duration::from_secs(300),
            cancel.clone(),
        )
        .unwrap();
        let handle = tokio::spawn(scheduler.run());

        // Ticks at 0s, 300s and 600s.
        tokio::time::sleep(Duration::from_secs(601)).await;
        cancel.cancel();
        let watermark = handle.await.unwrap();

        assert_eq!(fetcher.calls(), 3);
        assert_eq!(
            notifier.sent(),
            vec!["범식 등장|l2".to_string(), "또 범식|l3".to_string()]
        );
        assert_eq!(watermark.key(), "또 범식");
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_wait_is_cut_short_by_cancel() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![]));
        let watcher = Watcher::new(
            fetcher.clone(),
            Arc::new(RecordingNotifier::default()),
            rules(&["범식"]),
        );
        let cancel = CancellationToken::new();

        let scheduler = Scheduler::new(
            watcher,
            RetryPolicy::new(3, Duration::from_secs(60)),
            Duration::from_secs(300),
            cancel.clone(),
        )
        .unwrap();
        let handle = tokio::spawn(scheduler.run());

        tokio::time::sleep(Duration::from_secs(30)).await;
        cancel.cancel();
        let watermark = handle.await.unwrap();

        assert_eq!(fetcher.calls(), 1);
        assert!(watermark.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_during_slow_cycle_are_dropped() {
        let fetcher = Arc::new(SlowFetcher::new(Duration::from_secs(700)));
        let watcher = Watcher::new(
            fetcher.clone(),
            Arc::new(RecordingNotifier::default()),
            rules(&["범식"]),
        );
        let cancel = CancellationToken::new();

        let scheduler = Scheduler::new(
            watcher,
            RetryPolicy::new(3, Duration::from_secs(60)),
            Duration::from_secs(300),
            cancel.clone(),
        )
        .unwrap();
        let handle = tokio::spawn(scheduler.run());

        // The cycle started at 0s runs until 700s, swallowing the 300s and
        // 600s ticks. The next cycle starts on the 900s tick.
        tokio::time::sleep(Duration::from_secs(1000)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(fetcher.started(), vec![0, 900]);
    }
}
