//! Retry policies for connect loops and boot sequences
//!
//! A `RetryPolicy` is a plain value: how many attempts are allowed and how
//! long to wait between them. Components take one by value so tests can
//! swap the real multi-second waits for zero-delay policies.

use std::fmt;
use std::thread;
use std::time::Duration;

/// Delay schedule between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay after every failure
    Fixed(Duration),
    /// Doubling delay starting at `initial`, capped at `max`
    Exponential { initial: Duration, max: Duration },
}

/// How often and how patiently an operation is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (None = retry forever)
    pub max_attempts: Option<u32>,
    /// Delay schedule between attempts
    pub backoff: Backoff,
}

/// Returned when a bounded policy runs out of attempts
#[derive(Debug)]
pub struct RetryError<E> {
    /// Number of attempts that were made
    pub attempts: u32,
    /// Error from the final attempt
    pub last: E,
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gave up after {} attempts: {}", self.attempts, self.last)
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for RetryError<E> {}

impl RetryPolicy {
    /// Retry forever with a fixed delay
    pub fn unbounded(delay: Duration) -> Self {
        Self {
            max_attempts: None,
            backoff: Backoff::Fixed(delay),
        }
    }

    /// Retry at most `attempts` times with a fixed delay
    pub fn bounded(attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: Some(attempts.max(1)),
            backoff: Backoff::Fixed(delay),
        }
    }

    /// Replace the delay schedule with exponential backoff
    pub fn with_exponential(mut self, initial: Duration, max: Duration) -> Self {
        self.backoff = Backoff::Exponential { initial, max };
        self
    }

    /// Whether another attempt is allowed after `failures` failed attempts
    pub fn allows_retry(&self, failures: u32) -> bool {
        match self.max_attempts {
            None => true,
            Some(max) => failures < max,
        }
    }

    /// Delay to wait after the `failures`-th failed attempt (1-based)
    pub fn delay_for(&self, failures: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { initial, max } => {
                let exponent = failures.saturating_sub(1).min(31);
                initial.saturating_mul(1u32 << exponent).min(max)
            }
        }
    }

    /// Run `op` until it succeeds or the policy is exhausted
    ///
    /// `op` receives the 1-based attempt number. Every failure is logged
    /// with `label` before sleeping.
    pub fn retry<T, E, F>(&self, label: &str, mut op: F) -> Result<T, RetryError<E>>
    where
        E: fmt::Display,
        F: FnMut(u32) -> Result<T, E>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if !self.allows_retry(attempt) {
                        tracing::warn!("{label}: attempt {attempt} failed, giving up: {e}");
                        return Err(RetryError { attempts: attempt, last: e });
                    }
                    let delay = self.delay_for(attempt);
                    tracing::info!("{label}: attempt {attempt} failed ({e}), retrying in {delay:?}");
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                }
            }
        }
    }
}
