//! Per-user token bucket rate limiting.
//!
//! Each (user, route class) pair owns a bucket holding up to one minute's
//! budget of tokens that refills continuously.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

/// How often idle buckets are swept.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Rate limiting errors
#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("Rate limit exceeded for {class} requests, retry in {}s", retry_after.as_secs())]
    LimitExceeded {
        class: RouteClass,
        retry_after: Duration,
    },
}

/// Budget group a route belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteClass {
    /// Anything that writes escalation fields.
    Write,
    /// Record and property-link reads.
    Read,
    /// Summary generation.
    Ai,
}

impl fmt::Display for RouteClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Write => "write",
            Self::Read => "read",
            Self::Ai => "ai",
        })
    }
}

/// Requests allowed per user per minute. Zero disables the class limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimits {
    pub write_per_minute: u32,
    pub read_per_minute: u32,
    pub ai_per_minute: u32,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            write_per_minute: 10,
            read_per_minute: 30,
            ai_per_minute: 20,
        }
    }
}

impl RateLimits {
    fn per_minute(&self, class: RouteClass) -> u32 {
        match class {
            RouteClass::Write => self.write_per_minute,
            RouteClass::Read => self.read_per_minute,
            RouteClass::Ai => self.ai_per_minute,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Bucket {
    tokens: f64,
    updated: Instant,
}

impl Bucket {
    fn refill(&mut self, capacity: f64, now: Instant) {
        let per_sec = capacity / 60.0;
        let elapsed = now.saturating_duration_since(self.updated).as_secs_f64();
        self.tokens = (self.tokens + elapsed * per_sec).min(capacity);
        self.updated = now;
    }
}

/// Rate limiter keyed by user and route class.
#[derive(Debug)]
pub struct RateLimiter {
    limits: RateLimits,
    buckets: RwLock<HashMap<(String, RouteClass), Bucket>>,
    last_cleanup: RwLock<Instant>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(limits: RateLimits) -> Self {
        Self {
            limits,
            buckets: RwLock::new(HashMap::new()),
            last_cleanup: RwLock::new(Instant::now()),
        }
    }

    /// Take one token from the user's bucket for `class`.
    pub async fn check(&self, user: &str, class: RouteClass) -> Result<(), RateLimitError> {
        let per_minute = self.limits.per_minute(class);
        if per_minute == 0 {
            return Ok(());
        }
        let capacity = f64::from(per_minute);
        let now = Instant::now();

        let mut buckets = self.buckets.write().await;
        self.perform_cleanup(&mut buckets, now).await;

        let bucket = buckets
            .entry((user.to_string(), class))
            .or_insert(Bucket {
                tokens: capacity,
                updated: now,
            });
        bucket.refill(capacity, now);

        if bucket.tokens < 1.0 {
            let missing = 1.0 - bucket.tokens;
            let wait = Duration::from_secs_f64(missing * 60.0 / capacity);
            // Round up so clients never retry early
            let retry_after =
                Duration::from_secs(wait.as_secs() + u64::from(wait.subsec_nanos() > 0));
            debug!(user, %class, retry_after = retry_after.as_secs(), "Rate limit exceeded");
            return Err(RateLimitError::LimitExceeded { class, retry_after });
        }

        bucket.tokens -= 1.0;
        Ok(())
    }

    /// Drop buckets that have refilled completely.
    async fn perform_cleanup(
        &self,
        buckets: &mut HashMap<(String, RouteClass), Bucket>,
        now: Instant,
    ) {
        let mut last_cleanup = self.last_cleanup.write().await;
        if now.saturating_duration_since(*last_cleanup) < CLEANUP_INTERVAL {
            return;
        }

        let before = buckets.len();
        let limits = self.limits;
        buckets.retain(|(_, class), bucket| {
            let capacity = f64::from(limits.per_minute(*class));
            let mut projected = *bucket;
            projected.refill(capacity, now);
            projected.tokens < capacity
        });
        *last_cleanup = now;
        debug!(removed = before - buckets.len(), "Swept idle rate limit buckets");
    }

    /// Number of live buckets.
    pub async fn len(&self) -> usize {
        self.buckets.read().await.len()
    }
}
