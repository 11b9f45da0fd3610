use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::redis_repo::RedisClient;

#[derive(Debug, thiserror::Error)]
#[error("Rate limiter backend failure: {0}")]
pub struct LimiterError(pub String);

/// Fixed-window request counter keyed by client.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Record a hit; `Ok(false)` once the key has exceeded its budget for the window.
    async fn check(&self, key: &str) -> Result<bool, LimiterError>;
}

pub struct RedisRateLimiter {
    redis: RedisClient,
    max_requests: u64,
    window_seconds: u64,
}

impl RedisRateLimiter {
    pub fn new(redis: RedisClient, max_requests: u64, window_seconds: u64) -> Self {
        Self {
            redis,
            max_requests,
            window_seconds,
        }
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn check(&self, key: &str) -> Result<bool, LimiterError> {
        let count = self
            .redis
            .incr_window(&format!("ratelimit:{}", key), self.window_seconds)
            .await
            .map_err(|e| LimiterError(e.to_string()))?;
        Ok(count <= self.max_requests)
    }
}

/// In-process limiter for single-instance deployments and tests.
pub struct MemoryRateLimiter {
    windows: Mutex<HashMap<String, (Instant, u64)>>,
    max_requests: u64,
    window: Duration,
}

impl MemoryRateLimiter {
    pub fn new(max_requests: u64, window_seconds: u64) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            max_requests,
            window: Duration::from_secs(window_seconds),
        }
    }
}

#[async_trait]
impl RateLimiter for MemoryRateLimiter {
    async fn check(&self, key: &str) -> Result<bool, LimiterError> {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;

        // Drop expired windows so idle clients do not accumulate.
        windows.retain(|_, (started, _)| now.duration_since(*started) < self.window);

        let entry = windows.entry(key.to_string()).or_insert((now, 0));
        entry.1 += 1;
        Ok(entry.1 <= self.max_requests)
    }
}
