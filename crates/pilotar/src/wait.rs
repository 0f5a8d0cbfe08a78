//! Condition polling: the synchronization core.
//!
//! Every wait in the harness goes through [`poll_until`]: a loop that
//! re-evaluates a condition against the live session every poll interval
//! until it reports ready, the policy's timeout elapses, or a non-ignorable
//! failure occurs. Conditions must be idempotent; re-evaluating one must not
//! corrupt session state.

use crate::error::{ErrorKind, HarnessError, HarnessResult};
use std::future::Future;
use std::time::{Duration, Instant};

/// Default timeout for wait operations (10 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Navigation gate timeout (15 seconds)
pub const NAVIGATION_TIMEOUT_MS: u64 = 15_000;

/// Timeout for operations known to be slow: page-load-triggered table
/// refresh, upload processing (20 seconds)
pub const SLOW_TIMEOUT_MS: u64 = 20_000;

/// Default polling interval (200ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 200;

/// Outcome of one condition evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll<T> {
    /// The awaited state is present; carries the produced value
    Ready(T),
    /// Not there yet; keep polling
    Pending,
}

/// How long to wait, how often to re-evaluate, and which failure kinds to
/// swallow while waiting.
///
/// Invariant: the poll interval is strictly smaller than the timeout, so
/// polling never blocks the caller past the configured timeout. The setters
/// accept intermediate states in either order; the invariant is checked on
/// the assembled policy when [`poll_until`] consumes it.
#[derive(Debug, Clone)]
pub struct WaitPolicy {
    /// Total time budget
    pub timeout: Duration,
    /// Pause between evaluations
    pub poll_interval: Duration,
    /// Failure kinds treated as "not ready yet" instead of fatal
    pub ignored: Vec<ErrorKind>,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            ignored: vec![ErrorKind::NotFound, ErrorKind::Stale],
        }
    }
}

impl WaitPolicy {
    /// Default policy: 10s, standard transient set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Policy for the navigation gate: 15s, standard transient set
    #[must_use]
    pub fn navigation() -> Self {
        Self::default().with_timeout(Duration::from_millis(NAVIGATION_TIMEOUT_MS))
    }

    /// Policy for operations known to be slow: 20s, standard transient set
    #[must_use]
    pub fn slow() -> Self {
        Self::default().with_timeout(Duration::from_millis(SLOW_TIMEOUT_MS))
    }

    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the polling interval
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Replace the set of ignored failure kinds
    #[must_use]
    pub fn with_ignored(mut self, kinds: impl Into<Vec<ErrorKind>>) -> Self {
        self.ignored = kinds.into();
        self
    }

    /// Whether a failure kind is swallowed while waiting
    #[must_use]
    pub fn ignores(&self, kind: ErrorKind) -> bool {
        self.ignored.contains(&kind)
    }
}

/// Repeatedly evaluate `condition` until it reports [`Poll::Ready`], the
/// policy timeout elapses, or a non-ignorable failure occurs.
///
/// Evaluation failures whose kind is in the policy's ignored set are treated
/// as [`Poll::Pending`]; any other failure propagates immediately without
/// waiting for the timeout. On success the produced value returns at once.
/// The loop uses a monotonic clock and never overruns the timeout by more
/// than one poll interval plus one evaluation.
///
/// # Errors
///
/// [`HarnessError::Timeout`] if the condition never becomes ready, or the
/// first non-ignorable failure the condition reports.
pub async fn poll_until<T, F, Fut>(
    policy: &WaitPolicy,
    waiting_for: &str,
    mut condition: F,
) -> HarnessResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = HarnessResult<Poll<T>>>,
{
    debug_assert!(
        policy.poll_interval < policy.timeout,
        "poll interval must be strictly smaller than timeout"
    );
    let started = Instant::now();
    loop {
        match condition().await {
            Ok(Poll::Ready(value)) => return Ok(value),
            Ok(Poll::Pending) => {}
            Err(err) if policy.ignores(err.kind()) => {
                tracing::trace!(error = %err, "transient failure swallowed while polling");
            }
            Err(err) => return Err(err),
        }

        if started.elapsed() >= policy.timeout {
            return Err(HarnessError::Timeout {
                ms: policy.timeout.as_millis() as u64,
                waiting_for: waiting_for.to_string(),
            });
        }
        tokio::time::sleep(policy.poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_policy() -> WaitPolicy {
        WaitPolicy::default()
            .with_timeout(Duration::from_millis(200))
            .with_poll_interval(Duration::from_millis(10))
    }

    mod policy_tests {
        use super::*;

        #[test]
        fn test_default_policy() {
            let policy = WaitPolicy::default();
            assert_eq!(policy.timeout, Duration::from_millis(DEFAULT_TIMEOUT_MS));
            assert_eq!(
                policy.poll_interval,
                Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)
            );
            assert!(policy.ignores(ErrorKind::NotFound));
            assert!(policy.ignores(ErrorKind::Stale));
            assert!(!policy.ignores(ErrorKind::Script));
        }

        #[test]
        fn test_navigation_policy_timeout() {
            let policy = WaitPolicy::navigation();
            assert_eq!(policy.timeout, Duration::from_millis(NAVIGATION_TIMEOUT_MS));
        }

        #[test]
        fn test_slow_policy_timeout() {
            let policy = WaitPolicy::slow();
            assert_eq!(policy.timeout, Duration::from_millis(SLOW_TIMEOUT_MS));
        }

        #[test]
        fn test_builder_chaining() {
            let policy = WaitPolicy::new()
                .with_timeout(Duration::from_secs(3))
                .with_poll_interval(Duration::from_millis(25))
                .with_ignored(vec![ErrorKind::NotFound]);
            assert_eq!(policy.timeout, Duration::from_secs(3));
            assert_eq!(policy.poll_interval, Duration::from_millis(25));
            assert!(policy.ignores(ErrorKind::NotFound));
            assert!(!policy.ignores(ErrorKind::Stale));
        }

        #[test]
        fn test_poll_interval_smaller_than_timeout() {
            let policy = WaitPolicy::default();
            assert!(policy.poll_interval < policy.timeout);
        }

        #[test]
        fn test_setter_order_is_irrelevant() {
            // Shrinking the timeout below the default interval before the
            // interval itself is set must not reject the intermediate state.
            let timeout_first = WaitPolicy::default()
                .with_timeout(Duration::from_millis(200))
                .with_poll_interval(Duration::from_millis(10));
            let interval_first = WaitPolicy::default()
                .with_poll_interval(Duration::from_millis(10))
                .with_timeout(Duration::from_millis(200));
            assert_eq!(timeout_first.timeout, interval_first.timeout);
            assert_eq!(timeout_first.poll_interval, interval_first.poll_interval);
        }
    }

    mod poll_until_tests {
        use super::*;

        #[tokio::test]
        async fn test_ready_immediately_returns_value() {
            let result =
                poll_until(&fast_policy(), "immediate", || async { Ok(Poll::Ready(7)) }).await;
            assert_eq!(result.unwrap(), 7);
        }

        #[tokio::test]
        async fn test_pending_then_ready() {
            let attempts = Arc::new(AtomicU32::new(0));
            let counter = Arc::clone(&attempts);
            let result = poll_until(&fast_policy(), "third try", move || {
                let counter = Arc::clone(&counter);
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Ok(Poll::Pending)
                    } else {
                        Ok(Poll::Ready("done"))
                    }
                }
            })
            .await;
            assert_eq!(result.unwrap(), "done");
            assert_eq!(attempts.load(Ordering::SeqCst), 3);
        }

        #[tokio::test]
        async fn test_never_ready_times_out() {
            let result: HarnessResult<()> =
                poll_until(&fast_policy(), "nothing", || async { Ok(Poll::Pending) }).await;
            match result {
                Err(HarnessError::Timeout { ms, waiting_for }) => {
                    assert_eq!(ms, 200);
                    assert_eq!(waiting_for, "nothing");
                }
                other => panic!("expected timeout, got {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_transient_failure_is_retried() {
            let attempts = Arc::new(AtomicU32::new(0));
            let counter = Arc::clone(&attempts);
            let result = poll_until(&fast_policy(), "after transient", move || {
                let counter = Arc::clone(&counter);
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(HarnessError::ElementNotFound {
                            locator: "id=Name".to_string(),
                        })
                    } else {
                        Ok(Poll::Ready(1))
                    }
                }
            })
            .await;
            assert_eq!(result.unwrap(), 1);
            assert!(attempts.load(Ordering::SeqCst) >= 2);
        }

        #[tokio::test]
        async fn test_stale_failure_on_first_evaluation_is_retried() {
            let attempts = Arc::new(AtomicU32::new(0));
            let counter = Arc::clone(&attempts);
            let result = poll_until(&fast_policy(), "after stale", move || {
                let counter = Arc::clone(&counter);
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(HarnessError::StaleElement {
                            handle: "3".to_string(),
                        })
                    } else {
                        Ok(Poll::Ready(()))
                    }
                }
            })
            .await;
            assert!(result.is_ok());
        }

        #[tokio::test]
        async fn test_fatal_failure_propagates_immediately() {
            let started = Instant::now();
            let result: HarnessResult<()> = poll_until(&fast_policy(), "fatal", || async {
                Err(HarnessError::ScriptFailure {
                    message: "broken".to_string(),
                })
            })
            .await;
            match result {
                Err(HarnessError::ScriptFailure { message }) => assert_eq!(message, "broken"),
                other => panic!("expected script failure, got {other:?}"),
            }
            // No retry loop for fatal kinds: returns well before the timeout.
            assert!(started.elapsed() < Duration::from_millis(100));
        }

        #[tokio::test]
        async fn test_timeout_overrun_bounded_by_one_interval() {
            let policy = WaitPolicy::default()
                .with_timeout(Duration::from_millis(100))
                .with_poll_interval(Duration::from_millis(20));
            let started = Instant::now();
            let result: HarnessResult<()> =
                poll_until(&policy, "bounded", || async { Ok(Poll::Pending) }).await;
            assert!(result.is_err());
            assert!(started.elapsed() >= Duration::from_millis(100));
            assert!(started.elapsed() < Duration::from_millis(100 + 20 + 50));
        }

        #[tokio::test]
        async fn test_ignored_set_respected_over_default() {
            // A policy that does not ignore NotFound treats it as fatal.
            let policy = fast_policy().with_ignored(Vec::new());
            let result: HarnessResult<()> = poll_until(&policy, "strict", || async {
                Err(HarnessError::ElementNotFound {
                    locator: "tag=tr".to_string(),
                })
            })
            .await;
            assert!(matches!(
                result,
                Err(HarnessError::ElementNotFound { .. })
            ));
        }
    }
}
