//! Sliding-window rate limiting for the relay's shared gateway key.
//!
//! Limits the number of requests each caller can make within a time window.
//! The store is injected through [`RateLimitStore`]; the in-memory store
//! forgets everything on restart and is not shared between relay instances.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use toolshelf_config::RelayConfig;

/// Configuration for the rate limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum requests per caller inside one window.
    pub max_requests: usize,

    /// Length of the sliding window.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 3,
            window: Duration::from_secs(600),
        }
    }
}

impl From<&RelayConfig> for RateLimitConfig {
    fn from(config: &RelayConfig) -> Self {
        Self {
            max_requests: config.max_requests as usize,
            window: Duration::from_secs(config.window_secs),
        }
    }
}

/// Per-caller request history.
pub trait RateLimitStore: Send + Sync {
    /// Record a request from `caller` at `now` if it is under the limit.
    ///
    /// Returns `true` if the request is allowed, or `false` if the caller is
    /// rate-limited. Rejected requests are not recorded.
    fn try_acquire(&self, caller: &str, now: Instant) -> bool;

    /// Requests `caller` may still make at `now`.
    fn remaining(&self, caller: &str, now: Instant) -> usize;

    /// Drop callers with no request inside the window.
    fn prune(&self, now: Instant);
}

/// Process-local [`RateLimitStore`].
#[derive(Debug, Default)]
pub struct InMemoryRateLimitStore {
    config: RateLimitConfig,
    history: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl InMemoryRateLimitStore {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            history: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Number of callers currently tracked.
    pub fn tracked_callers(&self) -> usize {
        self.history.lock().map(|h| h.len()).unwrap_or(0)
    }

    fn expire(&self, timestamps: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&oldest) = timestamps.front() {
            if now.saturating_duration_since(oldest) >= self.config.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }
    }
}

impl RateLimitStore for InMemoryRateLimitStore {
    fn try_acquire(&self, caller: &str, now: Instant) -> bool {
        let Ok(mut history) = self.history.lock() else {
            return false;
        };
        let timestamps = history.entry(caller.to_string()).or_default();
        self.expire(timestamps, now);
        if timestamps.len() >= self.config.max_requests {
            return false;
        }
        timestamps.push_back(now);
        true
    }

    fn remaining(&self, caller: &str, now: Instant) -> usize {
        let Ok(mut history) = self.history.lock() else {
            return 0;
        };
        match history.get_mut(caller) {
            Some(timestamps) => {
                self.expire(timestamps, now);
                self.config.max_requests.saturating_sub(timestamps.len())
            }
            None => self.config.max_requests,
        }
    }

    fn prune(&self, now: Instant) {
        if let Ok(mut history) = self.history.lock() {
            history.retain(|_, timestamps| {
                self.expire(timestamps, now);
                !timestamps.is_empty()
            });
        }
    }
}
