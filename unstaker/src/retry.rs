use log::warn;
use std::fmt::Display;
use std::time::{Duration, SystemTime};

/// Wall clock and sleeping, kept behind a trait so runs can be simulated.
pub trait Timer {
    fn now(&self) -> SystemTime;

    fn sleep(&self, duration: Duration);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemTimer;

impl Timer for SystemTimer {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration)
    }
}

/// Fixed-delay retry. `max_attempts: None` retries forever.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
    pub max_attempts: Option<usize>,
}

impl RetryPolicy {
    pub const fn unbounded(delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: None,
        }
    }

    pub const fn bounded(delay: Duration, max_attempts: usize) -> Self {
        Self {
            delay,
            max_attempts: Some(max_attempts),
        }
    }

    /// Whether the `attempt`-th try (starting at 1) may run.
    pub fn allows(&self, attempt: usize) -> bool {
        self.max_attempts.map_or(true, |max| attempt <= max)
    }

    /// Runs `op` until it succeeds, sleeping `delay` after every failure.
    /// Once the attempts are used up the last error is returned.
    pub fn retry<T, E, F>(&self, timer: &dyn Timer, what: &str, mut op: F) -> Result<T, E>
    where
        E: Display,
        F: FnMut() -> Result<T, E>,
    {
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if !self.allows(attempt + 1) => return Err(e),
                Err(e) => {
                    warn!("{} (attempt {}): {}", what, attempt, e);
                    timer.sleep(self.delay);
                    attempt += 1;
                }
            }
        }
    }
}

/// Delays and retry policies of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pacing {
    /// Table page fetches.
    pub scan: RetryPolicy,
    /// Reference block and chain id lookups.
    pub tx_options: RetryPolicy,
    /// Wait between a push and the first validation read.
    pub settle: Duration,
    /// Wait before the single grace re-check.
    pub grace: Duration,
    /// Rebuild-and-push rounds for one batch, the first submission included.
    pub resubmit: RetryPolicy,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            scan: RetryPolicy::unbounded(Duration::from_secs(1)),
            tx_options: RetryPolicy::unbounded(Duration::from_millis(5)),
            settle: Duration::from_millis(1500),
            grace: Duration::from_millis(3500),
            resubmit: RetryPolicy::unbounded(Duration::ZERO),
        }
    }
}
