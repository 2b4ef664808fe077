//! Bounded retry with an escalating per-attempt timeout.

use std::time::Duration;

use tokio::time::sleep;

/// Retry policy for one adapter call.
///
/// Attempt `k` (0-based) runs with timeout `base_timeout + k * timeout_step`;
/// at most `max_retries` extra attempts follow the first one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base_timeout: Duration,
    pub timeout_step: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl RetryPolicy {
    pub fn new(
        base_timeout: Duration,
        timeout_step: Duration,
        max_retries: u32,
        retry_delay: Duration,
    ) -> Self {
        Self {
            base_timeout: base_timeout.max(Duration::from_millis(1)),
            timeout_step,
            max_retries,
            retry_delay,
        }
    }

    /// Total attempts including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    pub fn timeout_for(&self, attempt: u32) -> Duration {
        self.base_timeout
            .saturating_add(self.timeout_step.saturating_mul(attempt))
    }

    /// Run `op` until it succeeds or the attempt budget is spent.
    /// `op` receives the attempt index and the timeout it must honour.
    pub async fn retry_async<F, Fut, T, E>(&self, op: F) -> Result<T, E>
    where
        F: FnMut(u32, Duration) -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        self.retry_async_if(|_: &E| true, op).await
    }

    /// Like [`RetryPolicy::retry_async`], but an error for which `retryable`
    /// returns false is returned at once.
    pub async fn retry_async_if<P, F, Fut, T, E>(&self, retryable: P, mut op: F) -> Result<T, E>
    where
        P: Fn(&E) -> bool,
        F: FnMut(u32, Duration) -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        let mut attempt = 0;
        loop {
            match op(attempt, self.timeout_for(attempt)).await {
                Ok(val) => return Ok(val),
                Err(err) => {
                    attempt += 1;
                    if attempt >= self.max_attempts() || !retryable(&err) {
                        return Err(err);
                    }
                    if !self.retry_delay.is_zero() {
                        sleep(self.retry_delay).await;
                    }
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(8_000),
            Duration::from_millis(4_000),
            2,
            Duration::from_millis(500),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn timeout_escalates_per_attempt() {
        let p = RetryPolicy::new(
            Duration::from_millis(1000),
            Duration::from_millis(250),
            2,
            Duration::ZERO,
        );
        assert_eq!(p.max_attempts(), 3);
        assert_eq!(p.timeout_for(0), Duration::from_millis(1000));
        assert_eq!(p.timeout_for(1), Duration::from_millis(1250));
        assert_eq!(p.timeout_for(2), Duration::from_millis(1500));
    }

    #[test]
    fn new_clamps_zero_timeout() {
        let p = RetryPolicy::new(Duration::ZERO, Duration::ZERO, 0, Duration::ZERO);
        assert_eq!(p.base_timeout, Duration::from_millis(1));
        assert_eq!(p.max_attempts(), 1);
    }

    #[tokio::test]
    async fn retries_until_success() {
        let p = RetryPolicy::new(
            Duration::from_millis(10),
            Duration::from_millis(5),
            2,
            Duration::ZERO,
        );
        let seen = Arc::new(AtomicU32::new(0));
        let result: Result<Duration, &str> = p
            .retry_async(|attempt, timeout| {
                let seen = seen.clone();
                async move {
                    seen.fetch_add(1, Ordering::SeqCst);
                    if attempt < 2 {
                        Err("boom")
                    } else {
                        Ok(timeout)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), Duration::from_millis(20));
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_after_budget() {
        let p = RetryPolicy::new(
            Duration::from_millis(10),
            Duration::ZERO,
            1,
            Duration::from_millis(100),
        );
        let seen = Arc::new(AtomicU32::new(0));
        let result: Result<(), &str> = p
            .retry_async(|_, _| {
                let seen = seen.clone();
                async move {
                    seen.fetch_add(1, Ordering::SeqCst);
                    Err("nope")
                }
            })
            .await;
        assert_eq!(result, Err("nope"));
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_error_is_not_retried() {
        let p = RetryPolicy::new(
            Duration::from_millis(10),
            Duration::ZERO,
            2,
            Duration::from_millis(100),
        );
        let seen = Arc::new(AtomicU32::new(0));
        let result: Result<(), &str> = p
            .retry_async_if(
                |e: &&str| *e != "permanent",
                |_, _| {
                    let seen = seen.clone();
                    async move {
                        seen.fetch_add(1, Ordering::SeqCst);
                        Err("permanent")
                    }
                },
            )
            .await;
        assert_eq!(result, Err("permanent"));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}
