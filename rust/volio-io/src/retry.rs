//! Bounded retry of file operations that fail because another process
//! transiently holds the file.

use std::{
    path::Path,
    time::{Duration, Instant},
};

use crate::fs::shared;

/// Default retry window.
pub const FILE_RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// Default upper bound of a single randomized sleep between attempts.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(1);

/// How long, and how eagerly, a failing operation is reattempted.
///
/// An operation is attempted once. If it fails with an error the platform
/// classifies as transient, it is reattempted after a randomized sleep of
/// at most `max_backoff`, until it succeeds or `window` has elapsed since
/// the first failure. There is no way to cancel a running retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    window: Duration,
    max_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(window: Duration) -> RetryPolicy {
        RetryPolicy {
            window,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }

    /// A policy that never retries.
    pub fn none() -> RetryPolicy {
        RetryPolicy {
            window: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    pub fn with_max_backoff(mut self, max_backoff: Duration) -> RetryPolicy {
        self.max_backoff = max_backoff;
        self
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn max_backoff(&self) -> Duration {
        self.max_backoff
    }

    /// Runs `op` under this policy.
    ///
    /// # Arguments
    ///
    /// * `name` - Operation name, used in log messages.
    /// * `path` - Path the operation acts on, used in log messages.
    /// * `is_transient` - Decides whether a failure is worth retrying.
    ///   Any other failure is returned immediately.
    /// * `op` - The operation.
    ///
    /// # Returns
    ///
    /// The first successful result, or the last error once the window
    /// is exhausted.
    pub fn run<T>(
        &self,
        name: &str,
        path: &Path,
        is_transient: impl Fn(&std::io::Error) -> bool,
        mut op: impl FnMut() -> std::io::Result<T>,
    ) -> std::io::Result<T> {
        let mut last_err = match op() {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };
        if !is_transient(&last_err) {
            return Err(last_err);
        }

        let start = Instant::now();
        let mut attempts = 1u32;
        loop {
            let elapsed = start.elapsed();
            if elapsed >= self.window {
                log::warn!(
                    "{name} '{}' still failing after {attempts} attempts in {elapsed:?}: {last_err}",
                    path.display()
                );
                return Err(last_err);
            }

            let delay = shared::jittered_delay(self.max_backoff).min(self.window - elapsed);
            log::debug!(
                "{name} '{}' failed ({last_err}), retrying in {delay:?}",
                path.display()
            );
            std::thread::sleep(delay);

            attempts += 1;
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if is_transient(&e) => last_err = e,
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::new(FILE_RETRY_INTERVAL)
    }
}
