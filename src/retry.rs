//! Retry policy shared by every outbound HTTP call.
//!
//! One policy object wraps the SPARQL endpoint, the entity-search API and the
//! embedding service rather than each call site carrying its own loop.

use crate::error::Result;
use std::future::Future;
use std::time::Duration;

/// Bounded retry with linear backoff: sleep `base_delay * attempt` between attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay before the next attempt, given the attempt number that just failed (1-based).
    pub fn delay_for(&self, attempt: usize) -> Duration {
        self.base_delay * attempt as u32
    }

    /// Run `op` until it succeeds or the attempt ceiling is reached.
    /// The final failure propagates to the caller.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_attempts => {
                    let wait = self.delay_for(attempt);
                    log::warn!(
                        "{} failed (attempt {}/{}): {}. Retrying in {:?}",
                        what,
                        attempt,
                        self.max_attempts,
                        e,
                        wait
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => {
                    log::error!(
                        "{} failed after {} attempts: {}",
                        what,
                        self.max_attempts,
                        e
                    );
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KglinkError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_delay_grows_linearly() {
        let policy = RetryPolicy::new(3, Duration::from_secs(5));
        assert_eq!(policy.delay_for(1), Duration::from_secs(5));
        assert_eq!(policy.delay_for(2), Duration::from_secs(10));
        assert_eq!(policy.delay_for(3), Duration::from_secs(15));
    }

    #[test]
    fn test_zero_attempts_clamped_to_one() {
        let policy = RetryPolicy::new(0, Duration::from_secs(1));
        assert_eq!(policy.max_attempts, 1);
    }

    #[tokio::test]
    async fn test_run_succeeds_first_try() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let calls = AtomicUsize::new(0);
        let result = policy
            .run("op", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, KglinkError>(42)
            })
            .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_run_retries_then_succeeds() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let calls = AtomicUsize::new(0);
        let result = policy
            .run("op", || async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(KglinkError::Query("transient".to_string()))
                } else {
                    Ok(7)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_run_exhausts_attempts() {
        let policy = RetryPolicy::new(2, Duration::from_millis(1));
        let calls = AtomicUsize::new(0);
        let result: Result<()> = policy
            .run("op", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(KglinkError::Query("down".to_string()))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
