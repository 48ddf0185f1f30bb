//! Exponential backoff for transient network failures

use std::future::Future;
use std::time::Duration;

/// Delay before the attempt following `attempt` (1-based)
///
/// `min(base * 2^(attempt - 1), cap)`
pub fn backoff_delay(attempt: u32, base: Duration, cap: Duration) -> Duration {
    let exponent = attempt.saturating_sub(1).min(31);
    base.saturating_mul(1u32 << exponent).min(cap)
}

/// Retry policy for an operation
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
        }
    }
}

/// Run `operation` until it succeeds, the error is not retryable, or
/// attempts run out
///
/// The last error is returned on exhaustion.
pub async fn retry_with_backoff<F, Fut, T, E>(
    operation_name: &str,
    policy: RetryPolicy,
    is_retryable: impl Fn(&E) -> bool,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!(operation = operation_name, attempt, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if attempt < max_attempts && is_retryable(&e) => {
                let delay = backoff_delay(attempt, policy.base_delay, policy.max_delay);
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_delay_doubles_then_caps() {
        let base = Duration::from_millis(1000);
        let cap = Duration::from_millis(10_000);
        assert_eq!(backoff_delay(1, base, cap), Duration::from_millis(1000));
        assert_eq!(backoff_delay(2, base, cap), Duration::from_millis(2000));
        assert_eq!(backoff_delay(3, base, cap), Duration::from_millis(4000));
        assert_eq!(backoff_delay(5, base, cap), Duration::from_millis(10_000));
        assert_eq!(backoff_delay(60, base, cap), Duration::from_millis(10_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_stops_on_permanent_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = retry_with_backoff(
            "test",
            RetryPolicy::default(),
            |e: &String| e != "permanent",
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("permanent".to_string()) }
            },
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_succeeds_on_third_attempt() {
        let result: Result<u32, String> = retry_with_backoff(
            "test",
            RetryPolicy::default(),
            |_| true,
            |attempt| async move {
                if attempt < 3 {
                    Err(format!("transient {attempt}"))
                } else {
                    Ok(attempt)
                }
            },
        )
        .await;
        assert_eq!(result, Ok(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhaustion_returns_last_error() {
        let result: Result<(), String> = retry_with_backoff(
            "test",
            RetryPolicy::default(),
            |_| true,
            |attempt| async move { Err(format!("fail {attempt}")) },
        )
        .await;
        assert_eq!(result, Err("fail 3".to_string()));
    }
}
