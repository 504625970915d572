use std::thread;
use std::time::Duration;

use anyhow::Result;
use rand::Rng;

/// Backoff schedule for remote calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles each retry.
    pub base_delay: Duration,
    /// Upper bound of the uniform jitter added to every delay.
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            max_jitter: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Schedule with no sleep between attempts, for tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_jitter: Duration::ZERO,
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let exponential = self.base_delay.saturating_mul(2u32.saturating_pow(attempt));
        let jitter = if self.max_jitter.is_zero() {
            Duration::ZERO
        } else {
            self.max_jitter.mul_f64(rand::thread_rng().gen::<f64>())
        };
        exponential + jitter
    }
}

/// Run a fallible remote operation under a retry policy: exponential
/// backoff plus jitter between attempts, last error returned once the
/// ceiling is exhausted.
///
/// Higher-order on purpose — wrap the call site, don't copy the loop.
pub fn with_retry<T>(policy: &RetryPolicy, mut op: impl FnMut() -> Result<T>) -> Result<T> {
    let attempts = policy.max_attempts.max(1);
    let mut last_err = None;
    for attempt in 0..attempts {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt + 1 < attempts {
                    let wait = policy.backoff(attempt);
                    tracing::warn!(
                        "remote call failed (attempt {}/{}), retrying in {:?}: {}",
                        attempt + 1,
                        attempts,
                        wait,
                        err
                    );
                    thread::sleep(wait);
                }
                last_err = Some(err);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("operation never attempted")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_succeeds_after_transient_failures() {
        let mut calls = 0;
        let result = with_retry(&RetryPolicy::immediate(3), || {
            calls += 1;
            if calls < 3 {
                Err(anyhow!("connection reset"))
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_exhausting_the_ceiling_returns_last_error() {
        let mut calls = 0;
        let result: Result<()> = with_retry(&RetryPolicy::immediate(2), || {
            calls += 1;
            Err(anyhow!("failure {}", calls))
        });
        assert_eq!(calls, 2);
        assert_eq!(result.unwrap_err().to_string(), "failure 2");
    }

    #[test]
    fn test_first_success_short_circuits() {
        let mut calls = 0;
        let result = with_retry(&RetryPolicy::immediate(5), || {
            calls += 1;
            Ok(())
        });
        assert!(result.is_ok());
        assert_eq!(calls, 1);
    }
}
