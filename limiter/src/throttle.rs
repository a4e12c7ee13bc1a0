//! Pacing of outbound Google API calls.
//!
//! Two independent throttles compose: a per-user token bucket that spaces out
//! one user's calls, and a global semaphore that bounds how many calls are in
//! flight regardless of who issued them.

use std::{num::NonZeroU32, sync::Arc};

use common::error::{AppError, Res};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tokio::sync::{Semaphore, SemaphorePermit};

pub struct ProviderThrottle {
    per_user: DefaultKeyedRateLimiter<String>,
    in_flight: Arc<Semaphore>,
}

impl ProviderThrottle {
    pub fn new(calls_per_second: u32, max_concurrent: usize) -> Self {
        let rate = NonZeroU32::new(calls_per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            per_user: RateLimiter::keyed(Quota::per_second(rate)),
            in_flight: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Waits until `user_id` is admitted by its bucket and a global slot is
    /// free. The slot is held until the returned permit is dropped.
    pub async fn acquire(&self, user_id: &str) -> Res<SemaphorePermit<'_>> {
        self.per_user.until_key_ready(&user_id.to_string()).await;

        self.in_flight
            .acquire()
            .await
            .map_err(|e| AppError::Internal(format!("Provider throttle closed: {}", e)))
    }

    /// Drops buckets of users that have been idle long enough to be full again.
    pub fn prune(&self) {
        self.per_user.retain_recent();
        self.per_user.shrink_to_fit();
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::{Duration, Instant},
    };

    use super::*;

    #[tokio::test]
    async fn bounds_parallel_calls_across_users() {
        let throttle = Arc::new(ProviderThrottle::new(100, 2));
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks = (0..6).map(|i| {
            let throttle = throttle.clone();
            let current = current.clone();
            let peak = peak.clone();
            tokio::spawn(async move {
                let _slot = throttle.acquire(&format!("user_{}", i)).await?;
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(30)).await;
                current.fetch_sub(1, Ordering::SeqCst);
                Ok::<(), AppError>(())
            })
        });

        for result in futures::future::join_all(tasks).await {
            result.unwrap().unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn paces_a_single_user() {
        let throttle = ProviderThrottle::new(2, 10);
        let started = Instant::now();
        for _ in 0..3 {
            drop(throttle.acquire("user_a").await.unwrap());
        }
        // burst of two, third call waits for a refill
        assert!(started.elapsed() >= Duration::from_millis(400));

        let other = Instant::now();
        drop(throttle.acquire("user_b").await.unwrap());
        assert!(other.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn slot_is_returned_when_dropped() {
        let throttle = ProviderThrottle::new(100, 1);
        let slot = throttle.acquire("user_a").await.unwrap();
        let waiting = tokio::time::timeout(Duration::from_millis(50), throttle.acquire("user_b")).await;
        assert!(waiting.is_err());

        drop(slot);
        let next = tokio::time::timeout(Duration::from_millis(50), throttle.acquire("user_b")).await;
        assert!(next.is_ok());
    }
}
