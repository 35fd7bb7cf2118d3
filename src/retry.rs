//! Shared retry policy for page loads.
//!
//! Every page retries a failed load the same way: a fixed number of automatic
//! retries with a fixed delay between them, then a terminal error that the
//! user can retry by hand.

use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  max_retries: u32,
  delay: Duration,
  jitter: Option<Duration>,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self::new(DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY)
  }
}

impl RetryPolicy {
  pub fn new(max_retries: u32, delay: Duration) -> Self {
    Self {
      max_retries,
      delay,
      jitter: None,
    }
  }

  /// Policy that never retries.
  pub fn none() -> Self {
    Self::new(0, Duration::ZERO)
  }

  /// Add up to `jitter` of random extra delay to each retry.
  pub fn with_jitter(mut self, jitter: Duration) -> Self {
    self.jitter = Some(jitter);
    self
  }

  pub fn max_retries(&self) -> u32 {
    self.max_retries
  }

  #[cfg(test)]
  pub fn delay(&self) -> Duration {
    self.delay
  }

  #[cfg(test)]
  pub fn jitter(&self) -> Option<Duration> {
    self.jitter
  }

  /// Delay before the next attempt after `failures` consecutive failures,
  /// or `None` once the automatic retries are used up.
  pub fn next_delay(&self, failures: u32) -> Option<Duration> {
    if failures == 0 || failures > self.max_retries {
      return None;
    }

    let extra = match self.jitter {
      Some(jitter) if !jitter.is_zero() => {
        let millis = rand::thread_rng().gen_range(0..=jitter.as_millis() as u64);
        Duration::from_millis(millis)
      }
      _ => Duration::ZERO,
    };
    Some(self.delay.saturating_add(extra))
  }

  /// Run `op`, retrying failures according to this policy.
  ///
  /// Returns the first success, or the last error once retries are exhausted.
  pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
  {
    let mut failures = 0;
    loop {
      match op().await {
        Ok(value) => return Ok(value),
        Err(e) => {
          failures += 1;
          let Some(delay) = self.next_delay(failures) else {
            return Err(e);
          };
          warn!(
            attempt = failures,
            max_retries = self.max_retries,
            delay_ms = delay.as_millis() as u64,
            "attempt failed, retrying: {e}"
          );
          tokio::time::sleep(delay).await;
        }
      }
    }
  }
}
