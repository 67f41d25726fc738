//! Per-IP token bucket rate limiting.
//!
//! A cheap pre-filter in front of the defense machine: it bounds request
//! volume, while the defense machine judges credential failures. The two
//! are deliberately separate layers.

use std::{collections::HashMap, sync::Arc, sync::Mutex, time::Duration};

use hush_core::Environment;

/// Token bucket parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitConfig {
    /// Sustained request rate.
    pub requests_per_minute: u32,
    /// Bucket capacity (burst allowance).
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { requests_per_minute: 60, burst_size: 10 }
    }
}

impl RateLimitConfig {
    /// The stricter tier for authentication endpoints.
    pub fn auth() -> Self {
        Self { requests_per_minute: 10, burst_size: 3 }
    }
}

struct Bucket<I> {
    last_update: I,
    tokens: f64,
}

/// Per-IP token bucket limiter.
///
/// Buckets replenish lazily on access; there are no background timers.
/// Clones share the bucket map.
#[derive(Clone)]
pub struct RateLimiter<E: Environment> {
    env: E,
    config: RateLimitConfig,
    buckets: Arc<Mutex<HashMap<String, Bucket<E::Instant>>>>,
}

impl<E: Environment> RateLimiter<E> {
    /// Create a limiter with the given configuration.
    pub fn new(env: E, config: RateLimitConfig) -> Self {
        Self { env, config, buckets: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// Consume one token for the IP if available.
    ///
    /// Returns `false` when the request must be rejected.
    pub fn is_allowed(&self, ip: &str) -> bool {
        let now = self.env.now();
        let tokens_per_second = f64::from(self.config.requests_per_minute) / 60.0;
        let burst = f64::from(self.config.burst_size);

        let mut buckets = self.buckets.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        let bucket = buckets
            .entry(ip.to_string())
            .or_insert_with(|| Bucket { last_update: now, tokens: burst });

        let elapsed: Duration = now - bucket.last_update;
        bucket.tokens = burst.min(bucket.tokens + elapsed.as_secs_f64() * tokens_per_second);
        bucket.last_update = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Drop buckets idle longer than `max_age` to bound memory.
    pub fn cleanup_old_entries(&self, max_age: Duration) {
        let now = self.env.now();
        let mut buckets = self.buckets.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        buckets.retain(|_, bucket| now - bucket.last_update <= max_age);
    }

    /// Number of IPs currently tracked.
    pub fn tracked_ips(&self) -> usize {
        self.buckets.lock().unwrap_or_else(std::sync::PoisonError::into_inner).len()
    }
}
