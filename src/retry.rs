//! Bounded retry policy shared by readiness polling and port rechecks.

use std::future::Future;
use std::time::{Duration, Instant};

/// A bounded number of attempts separated by a fixed delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

/// Returned when every attempt was used without success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryExhausted {
    pub attempts: u32,
    pub waited: Duration,
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Call `check` until it returns `true` or attempts run out.
    ///
    /// `check` receives the 1-based attempt number. No delay follows the last
    /// attempt. On success the number of attempts used is returned.
    pub async fn run_until<F, Fut>(&self, mut check: F) -> Result<u32, RetryExhausted>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = bool>,
    {
        let start = Instant::now();

        for attempt in 1..=self.max_attempts {
            if check(attempt).await {
                return Ok(attempt);
            }
            if attempt < self.max_attempts {
                tracing::debug!(
                    "Attempt {}/{} not ready, retrying in {:?}",
                    attempt,
                    self.max_attempts,
                    self.delay
                );
                if !self.delay.is_zero() {
                    tokio::time::sleep(self.delay).await;
                }
            }
        }

        Err(RetryExhausted {
            attempts: self.max_attempts,
            waited: start.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test]
    async fn stops_at_first_success() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::fixed(5, Duration::ZERO);
        let result = policy
            .run_until(|attempt| {
                calls.set(calls.get() + 1);
                async move { attempt == 3 }
            })
            .await;
        assert_eq!(result, Ok(3));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn exhausts_after_max_attempts() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::fixed(4, Duration::from_millis(5));
        let start = Instant::now();
        let result = policy
            .run_until(|_| {
                calls.set(calls.get() + 1);
                async { false }
            })
            .await;
        let err = result.unwrap_err();
        assert_eq!(err.attempts, 4);
        assert_eq!(calls.get(), 4);
        // Three sleeps of 5ms; generous upper bound for slow CI.
        assert!(start.elapsed() >= Duration::from_millis(15));
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn zero_attempts_is_clamped_to_one() {
        assert_eq!(RetryPolicy::fixed(0, Duration::ZERO).max_attempts, 1);
    }
}
