//! Bounded retry for operations racing a resource lock.
//!
//! The service enforces single-writer-per-resource semantics: while an action
//! is in flight its target cluster is locked, and a dependent operation issued
//! right behind it can see a transient 409 that clears within seconds. The
//! retrier absorbs that scheduling jitter without masking persistent
//! failures, which surface as the final degraded value for the caller to
//! assert against.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use crate::error::{ClientError, Result};

/// Outcome of one attempt of a retried operation.
///
/// `Failed` is a soft failure: the operation completed but its terminal state
/// was a domain-level failure (e.g. the awaited action ended `FAILED` instead
/// of `SUCCEEDED`). Soft failures are retried like conflicts, but when the
/// attempt budget runs out the last one is returned as-is rather than raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt<T> {
    Succeeded(T),
    Failed(T),
}

impl<T> Attempt<T> {
    /// True for a successful terminal state.
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    /// Unwrap the carried value, whichever way the attempt went.
    pub fn into_inner(self) -> T {
        match self {
            Self::Succeeded(v) | Self::Failed(v) => v,
        }
    }
}

/// Attempt bound and fixed backoff for [`retry_on_conflict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub attempts: u32,
    /// Fixed delay between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            delay: Duration::from_secs(2),
        }
    }
}

/// Run `op` until it succeeds, retrying on lock conflicts and soft failures.
///
/// - `Ok(Attempt::Succeeded(_))` returns immediately.
/// - `Ok(Attempt::Failed(_))` is retried; on exhaustion the last failed value
///   is returned without error.
/// - `Err(e)` with `e.is_conflict()` is retried; on exhaustion the last
///   conflict propagates.
/// - Any other error propagates immediately.
///
/// A fixed `policy.delay` sleep separates attempts; nothing sleeps after the
/// last one. The retrier holds no state across calls.
pub async fn retry_on_conflict<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<Attempt<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Attempt<T>>>,
{
    let attempts = policy.attempts.max(1);
    let mut last: Option<Result<Attempt<T>>> = None;

    for attempt in 1..=attempts {
        match op().await {
            Ok(Attempt::Succeeded(v)) => {
                if attempt > 1 {
                    debug!(attempt, "operation succeeded after retry");
                }
                return Ok(Attempt::Succeeded(v));
            }
            Ok(Attempt::Failed(v)) => {
                debug!(attempt, attempts, "operation ended in a failed terminal state");
                last = Some(Ok(Attempt::Failed(v)));
            }
            Err(e) if e.is_conflict() => {
                debug!(attempt, attempts, error = %e, "resource locked, will retry");
                last = Some(Err(e));
            }
            Err(e) => return Err(e),
        }
        if attempt < attempts {
            sleep(policy.delay).await;
        }
    }

    // The loop always records an outcome before falling through.
    last.unwrap_or(Err(ClientError::RetryExhausted(attempts)))
}
