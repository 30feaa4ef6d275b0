// src/pipeline/retry.rs

//! Bounded retry around a single poll cycle.
//!
//! A cycle is retried when it fails (in practice: the fetch came back empty),
//! with a fixed, cancellable wait between attempts.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::AppError;
use crate::models::{ScheduleConfig, Watermark};
use crate::pipeline::process::{CycleReport, Watcher};

/// How many times to try a cycle and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    pub fn from_config(schedule: &ScheduleConfig) -> Self {
        Self::new(schedule.max_retries, schedule.retry_interval())
    }
}

/// How a retried cycle ended.
#[derive(Debug)]
pub enum RetryOutcome {
    /// The cycle succeeded on attempt number `attempts`.
    Succeeded { report: CycleReport, attempts: u32 },
    /// Every attempt failed.
    Exhausted { attempts: u32, last_error: AppError },
    /// Cancelled before or while waiting to retry.
    Cancelled { attempts: u32 },
}

impl RetryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RetryOutcome::Succeeded { .. })
    }
}

/// Wait for `duration` unless `cancel` fires first. Returns `false` if cancelled.
pub async fn wait_or_cancel(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

/// Run one cycle, retrying failures according to `policy`.
///
/// No wait follows the final attempt. A `max_attempts` of 0 still makes one
/// attempt.
pub async fn run_with_retry(
    watcher: &Watcher,
    watermark: &mut Watermark,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> RetryOutcome {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempts = 0;

    loop {
        if cancel.is_cancelled() {
            return RetryOutcome::Cancelled { attempts };
        }

        attempts += 1;
        let error = match watcher.check(watermark).await {
            Ok(report) => return RetryOutcome::Succeeded { report, attempts },
            Err(e) => e,
        };

        if attempts >= max_attempts {
            log::error!(
                "Giving up after {} attempts ({}). Trying again at the next scheduled tick.",
                attempts,
                error
            );
            return RetryOutcome::Exhausted {
                attempts,
                last_error: error,
            };
        }

        log::warn!(
            "Check failed: {}. Retrying in {}s ({}/{})",
            error,
            policy.interval.as_secs(),
            attempts,
            max_attempts
        );

        if !wait_or_cancel(policy.interval, cancel).await {
            log::info!("Retry wait cancelled");
            return RetryOutcome::Cancelled { attempts };
        }
    }
}
