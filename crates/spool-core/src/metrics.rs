//! Outcome reporting for write attempts.
//!
//! The store tells a [`MetricsSink`] about every enqueue: success, or failure
//! with a message. [`FailureStats`] is the default sink. It keeps counters and
//! logs failures at most once per interval, so a full or broken disk does not
//! flood the log with one warning per dropped batch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::warn;

/// Prefix of every logged disk write failure.
pub const DISK_FAILURE_PREFIX: &str =
    "Unable to store telemetry to disk (telemetry will be discarded):";

/// Default minimum time between two logged failures.
pub const DEFAULT_LOG_INTERVAL: Duration = Duration::from_secs(300);

/// Receives the outcome of every enqueue attempt.
pub trait MetricsSink: Send + Sync {
    fn record_success(&self);

    fn record_failure(&self, message: &str);
}

/// Point-in-time copy of [`FailureStats`] counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub successes: u64,
    pub failures: u64,
    /// Failures counted but not logged because of throttling.
    pub suppressed: u64,
}

/// Counting sink with throttled failure logging.
#[derive(Debug)]
pub struct FailureStats {
    successes: AtomicU64,
    failures: AtomicU64,
    suppressed: AtomicU64,
    log_interval: Duration,
    last_logged: Mutex<Option<Instant>>,
}

impl Default for FailureStats {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_INTERVAL)
    }
}

impl FailureStats {
    pub fn new(log_interval: Duration) -> Self {
        Self {
            successes: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            suppressed: AtomicU64::new(0),
            log_interval,
            last_logged: Mutex::new(None),
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
        }
    }

    /// Whether a failure seen now should be logged. Updates the last log time.
    fn should_log(&self, now: Instant) -> bool {
        let mut last = self
            .last_logged
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match *last {
            Some(at) if now.duration_since(at) < self.log_interval => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }
}

impl MetricsSink for FailureStats {
    fn record_success(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failure(&self, message: &str) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        if self.should_log(Instant::now()) {
            let suppressed = self.suppressed.swap(0, Ordering::Relaxed);
            warn!(suppressed, "{} {}", DISK_FAILURE_PREFIX, message);
        } else {
            self.suppressed.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_successes_and_failures() {
        let stats = FailureStats::new(Duration::ZERO);
        stats.record_success();
        stats.record_success();
        stats.record_failure("disk full");

        let snap = stats.snapshot();
        assert_eq!(snap.successes, 2);
        assert_eq!(snap.failures, 1);
        assert_eq!(snap.suppressed, 0);
    }

    #[test]
    fn test_failures_within_interval_are_suppressed() {
        let stats = FailureStats::new(Duration::from_secs(3600));
        stats.record_failure("one");
        stats.record_failure("two");
        stats.record_failure("three");

        let snap = stats.snapshot();
        assert_eq!(snap.failures, 3);
        assert_eq!(snap.suppressed, 2);
    }

    #[test]
    fn test_should_log_after_interval() {
        let stats = FailureStats::new(Duration::from_millis(10));
        let start = Instant::now();
        assert!(stats.should_log(start));
        assert!(!stats.should_log(start + Duration::from_millis(5)));
        assert!(stats.should_log(start + Duration::from_millis(20)));
    }

    #[test]
    fn test_usable_as_trait_object() {
        let sink: std::sync::Arc<dyn MetricsSink> = std::sync::Arc::new(FailureStats::default());
        sink.record_success();
    }
}
