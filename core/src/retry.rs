//! Bounded exponential-backoff retry.
//!
//! # Design
//! The policy knows nothing about failure kinds beyond its predicate. The
//! default predicate retries only `Http` failures with a 5xx status, so
//! network errors, cancellations and 4xx responses surface after one
//! attempt. Only the failure that ends the loop is returned; earlier ones
//! are logged and dropped.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::cancel::CancelSignal;
use crate::error::ApiError;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);

/// Decides whether a failure is worth another attempt.
pub type RetryPredicate = Arc<dyn Fn(&ApiError) -> bool + Send + Sync>;

/// Retries `Http` failures with `status >= 500`, nothing else.
pub fn retry_on_server_error(err: &ApiError) -> bool {
    err.as_http().is_some_and(|failure| failure.is_server_error())
}

/// How many times to retry and how long to wait in between.
#[derive(Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    retry_on: RetryPredicate,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            retry_on: Arc::new(retry_on_server_error),
        }
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .finish_non_exhaustive()
    }
}

impl RetryPolicy {
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn retry_on<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&ApiError) -> bool + Send + Sync + 'static,
    {
        self.retry_on = Arc::new(predicate);
        self
    }

    /// Whether the failure of attempt `attempt` (0-based) earns a retry.
    pub fn should_retry(&self, err: &ApiError, attempt: u32) -> bool {
        attempt < self.max_retries && (self.retry_on)(err)
    }

    /// Backoff before the retry that follows attempt `attempt`:
    /// `base_delay * 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Run `operation` under `policy`.
///
/// Total attempts never exceed `max_retries + 1`.
pub async fn with_retry<T, F, Fut>(operation: F, policy: &RetryPolicy) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    retry_loop(operation, policy, None).await
}

/// Like `with_retry`, but stops with `ApiError::Cancelled` once `signal`
/// fires. The signal is checked before every attempt and interrupts a
/// backoff wait.
pub async fn with_retry_until_cancelled<T, F, Fut>(
    operation: F,
    policy: &RetryPolicy,
    signal: &CancelSignal,
) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    retry_loop(operation, policy, Some(signal)).await
}

async fn retry_loop<T, F, Fut>(
    mut operation: F,
    policy: &RetryPolicy,
    signal: Option<&CancelSignal>,
) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut attempt = 0;
    loop {
        if signal.is_some_and(CancelSignal::is_cancelled) {
            return Err(ApiError::Cancelled);
        }

        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(ApiError::Cancelled) => return Err(ApiError::Cancelled),
            Err(err) => err,
        };
        if !policy.should_retry(&err, attempt) {
            return Err(err);
        }

        let delay = policy.delay_for(attempt);
        warn!(
            attempt = attempt + 1,
            max_retries = policy.max_retries,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "request failed, retrying"
        );

        match signal {
            Some(signal) => {
                tokio::select! {
                    _ = signal.cancelled() => return Err(ApiError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            None => tokio::time::sleep(delay).await,
        }
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use serde_json::Value;
    use tokio::time::Instant;

    use crate::cancel::CancelToken;
    use crate::error::{HttpFailure, NetworkFailure};

    fn http(status: u16) -> ApiError {
        ApiError::Http(HttpFailure::new(status, "", Value::Null))
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_three_server_errors() {
        let attempts = AtomicU32::new(0);
        let started: Mutex<Vec<Instant>> = Mutex::new(Vec::new());

        let result = with_retry(
            || async {
                started.lock().unwrap().push(Instant::now());
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                if n < 3 {
                    Err(http(500))
                } else {
                    Ok("ok")
                }
            },
            &RetryPolicy::default(),
        )
        .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(attempts.load(Ordering::SeqCst), 4);

        let started = started.lock().unwrap();
        let gaps: Vec<u128> = started
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).as_millis())
            .collect();
        assert_eq!(gaps.len(), 3);
        for (gap, expected) in gaps.iter().zip([500, 1000, 2000]) {
            assert!(*gap >= expected && *gap < expected + 5, "{gaps:?}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn client_errors_are_not_retried() {
        let attempts = AtomicU32::new(0);
        let err = with_retry(
            || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(http(404))
            },
            &RetryPolicy::default(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status(), Some(404));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn network_and_cancelled_are_not_retried() {
        let failures: [fn() -> ApiError; 2] = [
            || ApiError::from(NetworkFailure::new("refused")),
            || ApiError::Cancelled,
        ];
        for make in failures {
            let attempts = AtomicU32::new(0);
            let result = with_retry(
                || async {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(make())
                },
                &RetryPolicy::default(),
            )
            .await;
            assert!(result.is_err());
            assert_eq!(attempts.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_surface_last_failure() {
        let attempts = AtomicU32::new(0);
        let err = with_retry(
            || async {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                // Distinct status per attempt so the surfaced one is identifiable.
                Err::<(), _>(http(500 + n as u16))
            },
            &RetryPolicy::default().max_retries(3),
        )
        .await
        .unwrap_err();

        assert_eq!(attempts.load(Ordering::SeqCst), 4);
        assert_eq!(err.status(), Some(503));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_retries_means_single_attempt() {
        let attempts = AtomicU32::new(0);
        let result = with_retry(
            || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(http(503))
            },
            &RetryPolicy::default().max_retries(0),
        )
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn custom_predicate_replaces_default() {
        let attempts = AtomicU32::new(0);
        let policy = RetryPolicy::default()
            .base_delay(Duration::from_millis(10))
            .retry_on(|err| err.status() == Some(429));

        let result = with_retry(
            || async {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                if n == 0 {
                    Err::<(), _>(http(429))
                } else {
                    Err(http(500))
                }
            },
            &policy,
        )
        .await;

        assert_eq!(result.unwrap_err().status(), Some(500));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_is_terminal_under_permissive_predicate() {
        let token = CancelToken::new();
        token.cancel();
        let signal = token.signal();
        let attempts = AtomicU32::new(0);
        let policy = RetryPolicy::default().retry_on(|_| true);

        let start = Instant::now();
        let err = with_retry(
            || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                signal.run(async { Ok::<(), ApiError>(()) }).await
            },
            &policy,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ApiError::Cancelled));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(start.elapsed() < Duration::from_millis(1));
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
        assert!(policy.delay_for(40) > policy.delay_for(2));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_retry_during_backoff() {
        let token = CancelToken::with_timeout(Duration::from_millis(700));
        let attempts = AtomicU32::new(0);

        let start = Instant::now();
        let err = with_retry_until_cancelled(
            || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(http(500))
            },
            &RetryPolicy::default(),
            &token.signal(),
        )
        .await
        .unwrap_err();

        // Attempts at 0ms and 500ms; the 1000ms backoff is cut short at 700ms.
        assert!(matches!(err, ApiError::Cancelled));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        let elapsed = start.elapsed().as_millis();
        assert!((700..710).contains(&elapsed), "{elapsed}");
    }
}
