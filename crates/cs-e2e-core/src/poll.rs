//! Bounded polling for eventually-consistent server state.
//!
//! Repository introspection, snapshot creation and task completion all happen
//! asynchronously on the server. [`poll`] invokes a probe, and while the
//! `should_continue` predicate holds for its result, sleeps for the configured
//! interval and probes again.
//!
//! Every call carries an attempt budget. Exhausting it fails with a
//! [`PollTimeout`], which callers can recover with `downcast_ref`.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;

// ============================================================================
// Constants
// ============================================================================

/// Interval used by the task-wait helpers, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Attempt budget used when the caller does not pick one.
/// 600 probes at 100ms covers about a minute of server-side work.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 600;

/// The condition was still unmet when the attempt budget ran out.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("poll condition still unmet after {attempts} attempts ({elapsed:?})")]
pub struct PollTimeout {
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Interval and attempt budget for a single [`poll`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollOptions {
    /// A budget of at least one attempt is always enforced.
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn from_millis(interval_ms: u64, max_attempts: u32) -> Self {
        Self::new(Duration::from_millis(interval_ms), max_attempts)
    }

    /// Derive the attempt budget from a wall-clock deadline.
    ///
    /// The first probe is free, so a deadline shorter than one interval still
    /// yields a single attempt.
    pub fn with_deadline(interval: Duration, deadline: Duration) -> Self {
        let interval_ms = interval.as_millis().max(1);
        let sleeps = deadline.as_millis() / interval_ms;
        let attempts = u32::try_from(sleeps.saturating_add(1)).unwrap_or(u32::MAX);
        Self::new(interval, attempts)
    }
}

impl Default for PollOptions {
    fn default() -> Self {
        Self::from_millis(DEFAULT_POLL_INTERVAL_MS, DEFAULT_MAX_ATTEMPTS)
    }
}

/// Probe until `should_continue` returns false, then return the last result.
///
/// The probe runs once immediately. Each time the predicate holds, the loop
/// sleeps for `options.interval` and probes again, so a predicate that holds
/// for exactly `k` results costs `1 + k` probes. Probe errors end the poll and
/// propagate unchanged.
pub async fn poll<T, F, Fut, P>(
    mut probe: F,
    mut should_continue: P,
    options: PollOptions,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    P: FnMut(&T) -> bool,
{
    let started = Instant::now();
    let mut attempts: u32 = 1;
    let mut result = probe().await?;

    while should_continue(&result) {
        if attempts >= options.max_attempts {
            return Err(PollTimeout {
                attempts,
                elapsed: started.elapsed(),
            }
            .into());
        }
        tokio::time::sleep(options.interval).await;
        attempts += 1;
        result = probe().await?;
    }

    debug!(attempts = attempts, "Poll condition satisfied");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_poll_single_call_when_already_done() {
        let mut calls = 0u32;
        let result = poll(
            || {
                calls += 1;
                async { Ok::<_, anyhow::Error>("Valid") }
            },
            |status| *status != "Valid",
            PollOptions::from_millis(100, 5),
        )
        .await
        .expect("poll should succeed");

        assert_eq!(result, "Valid");
        assert_eq!(calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_calls_one_plus_k_times() {
        let mut calls = 0u32;
        let result = poll(
            || {
                calls += 1;
                let n = calls;
                async move { Ok::<_, anyhow::Error>(n) }
            },
            |n| *n < 4,
            PollOptions::from_millis(100, 10),
        )
        .await
        .expect("poll should succeed");

        // Predicate held for 1, 2, 3 then turned false on 4
        assert_eq!(result, 4);
        assert_eq!(calls, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_sleeps_between_attempts() {
        let started = Instant::now();
        let mut calls = 0u32;
        poll(
            || {
                calls += 1;
                let n = calls;
                async move { Ok::<_, anyhow::Error>(n) }
            },
            |n| *n < 3,
            PollOptions::from_millis(250, 10),
        )
        .await
        .expect("poll should succeed");

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(500));
        assert!(elapsed < Duration::from_millis(750));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_times_out_with_distinct_error() {
        let mut calls = 0u32;
        let err = poll(
            || {
                calls += 1;
                async { Ok::<_, anyhow::Error>(false) }
            },
            |done| !*done,
            PollOptions::from_millis(100, 3),
        )
        .await
        .expect_err("poll should time out");

        let timeout = err
            .downcast_ref::<PollTimeout>()
            .expect("error should be a PollTimeout");
        assert_eq!(timeout.attempts, 3);
        assert!(timeout.elapsed >= Duration::from_millis(200));
        assert_eq!(calls, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_propagates_probe_error() {
        let mut calls = 0u32;
        let err = poll(
            || {
                calls += 1;
                let n = calls;
                async move {
                    if n == 2 {
                        anyhow::bail!("connection refused");
                    }
                    Ok(n)
                }
            },
            |_| true,
            PollOptions::from_millis(100, 10),
        )
        .await
        .expect_err("probe error should propagate");

        assert!(err.downcast_ref::<PollTimeout>().is_none());
        assert_eq!(err.to_string(), "connection refused");
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_poll_options_with_deadline() {
        let opts = PollOptions::with_deadline(Duration::from_millis(100), Duration::from_secs(1));
        assert_eq!(opts.max_attempts, 11);

        let short = PollOptions::with_deadline(Duration::from_secs(1), Duration::from_millis(10));
        assert_eq!(short.max_attempts, 1);
    }

    #[test]
    fn test_poll_options_never_zero_attempts() {
        assert_eq!(PollOptions::from_millis(10, 0).max_attempts, 1);
    }
}
