//! Async query abstraction for page loads with retry support.
//!
//! Inspired by TanStack Query, this module provides a `Query<T>` type that
//! encapsulates async data fetching, loading states, error handling and the
//! automatic retry loop every page shares.
//!
//! # Example
//!
//! ```ignore
//! let api = client.clone();
//! let mut query = Query::new(move || {
//!     let api = api.clone();
//!     async move { api.list_alerts().await }
//! })
//! .with_retry(RetryPolicy::default());
//!
//! // Start fetching
//! query.fetch();
//!
//! // In event loop tick
//! if query.poll() {
//!     // State changed, re-render
//! }
//!
//! // In render
//! match query.state() {
//!     QueryState::Loading => render_spinner(),
//!     QueryState::Success(data) => render_data(data),
//!     QueryState::Error(failure) if failure.will_retry() => render_retrying(failure),
//!     QueryState::Error(failure) => render_error_with_retry_button(failure),
//!     QueryState::Idle => {}
//! }
//! ```

use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::warn;

use crate::api::ApiError;
use crate::retry::RetryPolicy;

/// Why the last load failed, and whether another attempt is scheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFailure {
  pub message: String,
  /// The request hit its deadline rather than failing outright
  pub timed_out: bool,
  /// Consecutive failures since the last success or manual retry
  pub failures: u32,
  /// When the next automatic attempt starts; `None` once retries are exhausted
  pub retry_at: Option<Instant>,
}

impl QueryFailure {
  pub fn will_retry(&self) -> bool {
    self.retry_at.is_some()
  }
}

/// The state of a query
#[derive(Debug, Clone)]
pub enum QueryState<T> {
  /// Query has not been started
  Idle,
  /// Query is currently fetching data
  Loading,
  /// Query completed successfully
  Success(T),
  /// Query failed
  Error(QueryFailure),
}

impl<T> QueryState<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, QueryState::Loading)
  }

  pub fn is_success(&self) -> bool {
    matches!(self, QueryState::Success(_))
  }

  /// Success, or an error with no automatic retry left.
  pub fn is_settled(&self) -> bool {
    match self {
      QueryState::Success(_) => true,
      QueryState::Error(failure) => !failure.will_retry(),
      _ => false,
    }
  }

  #[cfg(test)]
  pub fn data(&self) -> Option<&T> {
    match self {
      QueryState::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn failure(&self) -> Option<&QueryFailure> {
    match self {
      QueryState::Error(failure) => Some(failure),
      _ => None,
    }
  }
}

/// A factory function that creates futures for fetching data
type FetcherFn<T> = Box<dyn Fn() -> BoxFuture<'static, Result<T, ApiError>> + Send + Sync>;

/// Async query for data fetching with state management.
///
/// Query<T> encapsulates:
/// - The fetching logic (via a closure)
/// - Loading/success/error states
/// - Async result handling via channels
/// - Scheduled automatic retries from a `RetryPolicy`
pub struct Query<T> {
  state: QueryState<T>,
  fetcher: FetcherFn<T>,
  receiver: Option<mpsc::UnboundedReceiver<Result<T, ApiError>>>,
  policy: RetryPolicy,
  failures: u32,
}

impl<T: Send + 'static> Query<T> {
  /// Create a new query with the given fetcher function.
  ///
  /// The fetcher is a closure that returns a future. It will be called
  /// each time the query starts a fetch, including automatic retries.
  pub fn new<F, Fut>(fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
  {
    Self {
      state: QueryState::Idle,
      fetcher: Box::new(move || fetcher().boxed()),
      receiver: None,
      policy: RetryPolicy::none(),
      failures: 0,
    }
  }

  /// Set the retry policy applied after a failed fetch.
  pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
    self.policy = policy;
    self
  }

  /// Get the current state of the query.
  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  /// Get the data if the query succeeded.
  #[cfg(test)]
  pub fn data(&self) -> Option<&T> {
    self.state.data()
  }

  /// Take ownership of the data, if the query succeeded.
  pub fn into_data(self) -> Option<T> {
    match self.state {
      QueryState::Success(data) => Some(data),
      _ => None,
    }
  }

  /// Check if the query is currently loading.
  #[cfg(test)]
  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  /// Check if the query succeeded.
  pub fn is_success(&self) -> bool {
    self.state.is_success()
  }

  /// Get the failure if the query failed.
  pub fn failure(&self) -> Option<&QueryFailure> {
    self.state.failure()
  }

  /// Start fetching data if not already loading.
  ///
  /// This is a no-op if the query is already loading.
  pub fn fetch(&mut self) {
    if self.state.is_loading() {
      return;
    }
    self.start_fetch();
  }

  /// Force a refetch, even if already loading or data exists.
  pub fn refetch(&mut self) {
    // Cancel any pending fetch by dropping the receiver
    self.receiver = None;
    self.start_fetch();
  }

  /// Manual retry after a terminal error. Resets the failure count so the
  /// automatic retries apply again.
  pub fn retry(&mut self) {
    self.failures = 0;
    self.refetch();
  }

  /// Poll for results from a pending fetch, and start a scheduled retry
  /// once its time has come.
  ///
  /// Returns `true` if the state changed.
  /// Call this in your event loop tick handler.
  pub fn poll(&mut self) -> bool {
    let Some(receiver) = &mut self.receiver else {
      return self.start_due_retry();
    };

    // Try to receive without blocking
    match receiver.try_recv() {
      Ok(Ok(data)) => {
        self.state = QueryState::Success(data);
        self.failures = 0;
        self.receiver = None;
        true
      }
      Ok(Err(error)) => {
        self.receiver = None;
        self.record_failure(error.to_string(), error.is_timeout());
        true
      }
      Err(mpsc::error::TryRecvError::Empty) => false,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        // Sender dropped without sending - treat as error
        self.receiver = None;
        self.record_failure("Query was cancelled".to_string(), false);
        true
      }
    }
  }

  /// Drive the query until it succeeds or fails with no retry left,
  /// calling `on_change` on every state change.
  pub async fn settle<F>(&mut self, tick: Duration, mut on_change: F) -> &QueryState<T>
  where
    F: FnMut(&QueryState<T>),
  {
    if matches!(self.state, QueryState::Idle) {
      self.fetch();
      on_change(&self.state);
    }

    while !self.state.is_settled() {
      tokio::time::sleep(tick).await;
      if self.poll() {
        on_change(&self.state);
      }
    }

    &self.state
  }

  fn record_failure(&mut self, message: String, timed_out: bool) {
    self.failures += 1;
    // A delay past the end of the clock means no retry is scheduled
    let retry_at = self
      .policy
      .next_delay(self.failures)
      .and_then(|delay| Instant::now().checked_add(delay));

    if retry_at.is_some() {
      warn!(
        failures = self.failures,
        max_retries = self.policy.max_retries(),
        "load failed, retry scheduled: {}",
        message
      );
    } else {
      warn!(failures = self.failures, "load failed, giving up: {}", message);
    }

    self.state = QueryState::Error(QueryFailure {
      message,
      timed_out,
      failures: self.failures,
      retry_at,
    });
  }

  fn start_due_retry(&mut self) -> bool {
    let due = matches!(
      &self.state,
      QueryState::Error(QueryFailure { retry_at: Some(at), .. }) if *at <= Instant::now()
    );
    if due {
      self.start_fetch();
    }
    due
  }

  /// Internal: start the fetch operation
  fn start_fetch(&mut self) {
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    self.state = QueryState::Loading;

    let future = (self.fetcher)();
    tokio::spawn(async move {
      let result = future.await;
      // Ignore send errors - receiver may have been dropped
      let _ = tx.send(result);
    });
  }
}

// Query is not Clone because the fetcher is boxed and receiver is owned.

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("state", &self.state)
      .field("failures", &self.failures)
      .finish_non_exhaustive()
  }
}
