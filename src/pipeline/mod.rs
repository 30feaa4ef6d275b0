//! Pipeline entry points for watcher operations.
//!
//! - `detect`: pure new-post detection against the watermark
//! - `Watcher`: fetch, detect, notify, move the watermark
//! - `run_with_retry`: bounded retry around one cycle
//! - `Scheduler`: fixed-interval polling until cancelled

pub mod detect;
pub mod process;
pub mod retry;
pub mod schedule;

pub use detect::{Detection, Match, detect, match_keyword};
pub use process::{CycleReport, WatchRules, Watcher};
pub use retry::{RetryOutcome, RetryPolicy, run_with_retry, wait_or_cancel};
pub use schedule::{Scheduler, Tick};
