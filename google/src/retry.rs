//! Exponential backoff for Google API quota errors.
//!
//! Only HTTP 429 is retried. Every other failure ends the loop at once.

use std::{future::Future, time::Duration};

use common::error::{AppError, Res};
use rand::Rng;

/// Outcome of a single attempt.
#[derive(Debug)]
pub enum Attempt<T> {
    Done(T),
    /// Quota exceeded, worth another try after a pause.
    Retryable(AppError),
    Fatal(AppError),
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (default: 3)
    pub max_attempts: u32,
    /// Pause after the first quota error, doubled after each further one (default: 1s)
    pub initial_delay: Duration,
    /// Upper bound of the random jitter added to each pause (default: 200ms)
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            max_jitter: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    fn jitter(&self) -> Duration {
        let max = self.max_jitter.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(0..=max))
    }
}

/// Runs `attempt` until it is done, fails fatally, or the attempts are used up.
///
/// The closure receives the 1-based attempt number.
pub async fn with_backoff<F, Fut, T>(policy: &RetryPolicy, mut attempt: F) -> Res<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Attempt<T>>,
{
    let mut delay = policy.initial_delay;

    for n in 1..=policy.max_attempts {
        match attempt(n).await {
            Attempt::Done(value) => {
                if n > 1 {
                    log::info!("Google API call succeeded on attempt {}", n);
                }
                return Ok(value);
            }
            Attempt::Fatal(error) => return Err(error),
            Attempt::Retryable(error) => {
                let pause = delay + policy.jitter();
                log::warn!(
                    "Google API quota exceeded (attempt {}/{}): {}. Waiting {}ms",
                    n,
                    policy.max_attempts,
                    error,
                    pause.as_millis()
                );
                tokio::time::sleep(pause).await;
                delay *= 2;
            }
        }
    }

    Err(AppError::TooManyRequests(format!(
        "Google API quota still exceeded after {} attempts",
        policy.max_attempts
    )))
}
