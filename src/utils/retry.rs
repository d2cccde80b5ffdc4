use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

// ============================================================================
// Bounded Exponential Backoff
// ============================================================================
//
// Transient-failure retry for the external collaborators (SMTP delivery).
// The primary persistence path never goes through this; a store failure is
// surfaced immediately.
//
// ============================================================================

#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Run `operation` until it succeeds or attempts are exhausted,
    /// returning the last error in the latter case.
    pub async fn run<F, Fut, T, E>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut delay = self.initial_delay;

        // A zero-attempt policy still runs the operation once.
        let max_attempts = self.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(attempt, "operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) if attempt == max_attempts => {
                    tracing::error!(attempt, error = %error, "operation failed after all retries");
                    return Err(error);
                }
                Err(error) => {
                    tracing::warn!(
                        attempt,
                        error = %error,
                        delay_ms = delay.as_millis(),
                        "operation failed, retrying after delay"
                    );
                    sleep(delay).await;
                    delay = Duration::from_millis(
                        ((delay.as_millis() as f64) * self.multiplier) as u64,
                    )
                    .min(self.max_delay);
                }
            }
        }

        unreachable!("the loop always runs at least once")
    }
}
