//! Token-bucket rate limiter keyed by client IP.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;
use crate::error::{Error, Result};

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// In-process request budget per client IP.
pub struct RateLimiter {
    max_tokens: u32,
    window: Duration,
    buckets: Mutex<HashMap<IpAddr, Bucket>>,
}

impl RateLimiter {
    /// `max_requests` per `window_secs`, refilled continuously.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            max_tokens: config.max_requests.max(1),
            window: Duration::from_secs(config.window_secs.max(1)),
            buckets: Mutex::new(HashMap::new()),
        }
    }

    fn buckets(&self) -> MutexGuard<'_, HashMap<IpAddr, Bucket>> {
        // A panic while holding the lock leaves the map usable.
        self.buckets.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Spend one token for `ip`.
    ///
    /// Returns the tokens left, or [`Error::TooManyRequests`] carrying the
    /// seconds until one is available again.
    pub fn check(&self, ip: IpAddr) -> Result<u32> {
        let max = self.max_tokens as f64;
        let refill_rate = max / self.window.as_secs_f64();
        let now = Instant::now();

        let mut buckets = self.buckets();
        let bucket = buckets.entry(ip).or_insert(Bucket {
            tokens: max,
            last_refill: now,
        });

        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * refill_rate).min(max);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            Ok(bucket.tokens as u32)
        } else {
            let retry_after = ((1.0 - bucket.tokens) / refill_rate).ceil() as u64;
            Err(Error::TooManyRequests {
                retry_after: retry_after.max(1),
            })
        }
    }

    /// Drop buckets idle for two windows; they would be full anyway.
    pub fn cleanup(&self) {
        let now = Instant::now();
        let idle = self.window * 2;
        self.buckets()
            .retain(|_, bucket| now.duration_since(bucket.last_refill) < idle);
    }
}
