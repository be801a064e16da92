//! Bounded retry for filesystem operations that fail transiently.
//!
//! On some platforms a file that was just read can stay locked for a short
//! moment, so deleting it fails once and succeeds a little later.

use std::thread;
use std::time::Duration;

use tracing::debug;

/// How many times to try, and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 2,
            backoff: Duration::from_millis(100),
        }
    }
}

/// All attempts failed.
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub last_error: E,
    pub attempts: u32,
}

impl RetryPolicy {
    /// A zero attempt count is treated as one.
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff,
        }
    }

    /// Retry without sleeping.
    pub fn immediate(attempts: u32) -> Self {
        Self::new(attempts, Duration::ZERO)
    }

    /// Run `op` until it succeeds or the attempts run out.
    ///
    /// `op` receives the 1-based attempt number. The backoff is only slept
    /// between attempts, never after the last one.
    pub fn run<T, E, F>(&self, mut op: F) -> Result<T, RetryExhausted<E>>
    where
        F: FnMut(u32) -> Result<T, E>,
        E: std::fmt::Display,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= attempts => {
                    return Err(RetryExhausted {
                        last_error: err,
                        attempts: attempt,
                    });
                }
                Err(err) => {
                    debug!(attempt, max_attempts = attempts, error = %err, "attempt failed, retrying");
                    if !self.backoff.is_zero() {
                        thread::sleep(self.backoff);
                    }
                    attempt += 1;
                }
            }
        }
    }
}
