//! Rate limiting service with interchangeable store backends
//!
//! Two stores implement the same contract: an in-process map with a fixed
//! window anchored at the first request, and a Redis-backed sliding window
//! evaluated atomically in a Lua script. The backend is picked once at
//! startup from configuration and injected; the two windows admit slightly
//! differently near window boundaries, which is a known and accepted
//! difference.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use redis::aio::ConnectionManager;
use tracing::{debug, warn};

use crate::config::RateLimitConfig;
use crate::error::Result;

/// Result of a rate limit check
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    /// Whether the request is allowed
    pub allowed: bool,
    /// Maximum number of requests allowed in the window
    pub limit: u32,
    /// Number of requests remaining in the current window
    pub remaining: u32,
    /// When the current window resets
    pub reset: DateTime<Utc>,
    /// Seconds to wait before retrying, set on denials
    pub retry_after: Option<u64>,
}

/// Counter for one identifier within one window.
///
/// At most one live entry exists per identifier; `count` never decreases
/// within a window. Expired entries are replaced, not merged.
#[derive(Debug, Clone)]
pub struct RateLimitEntry {
    pub count: u32,
    pub reset_time: DateTime<Utc>,
}

/// Keyed counter with expiry. `increment` must be atomic with respect to
/// concurrent callers sharing the same identifier.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    async fn increment(
        &self,
        identifier: &str,
        limit: u32,
        window: Duration,
    ) -> Result<RateLimitResult>;

    fn name(&self) -> &'static str;
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

type EntryMap = Mutex<HashMap<String, RateLimitEntry>>;

/// In-process store: fixed window anchored at the first request.
///
/// A background sweep bounds memory growth by removing expired entries; it
/// is best-effort only, since `increment` replaces expired entries lazily.
pub struct MemoryStore {
    entries: Arc<EntryMap>,
}

impl MemoryStore {
    pub fn new(cleanup_interval: Duration) -> Self {
        let entries = Arc::new(Mutex::new(HashMap::new()));
        Self::spawn_sweeper(Arc::downgrade(&entries), cleanup_interval);
        Self { entries }
    }

    /// The sweeper holds only a weak reference so it shuts down with the
    /// store instead of keeping it alive.
    fn spawn_sweeper(entries: Weak<EntryMap>, cleanup_interval: Duration) {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(cleanup_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick fires immediately; skip it.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(entries) = entries.upgrade() else {
                    break;
                };
                Self::sweep(&entries);
            }
        });
    }

    /// Remove entries whose window has passed. Never touches live entries.
    fn sweep(entries: &EntryMap) {
        let now = Utc::now();
        let mut map = lock_entries(entries);
        let before = map.len();
        map.retain(|_, entry| entry.reset_time > now);
        let removed = before - map.len();
        if removed > 0 {
            debug!(removed, "Swept expired rate limit entries");
        }
    }

    #[cfg(test)]
    fn entry(&self, identifier: &str) -> Option<RateLimitEntry> {
        lock_entries(&self.entries).get(identifier).cloned()
    }
}

fn lock_entries(entries: &EntryMap) -> MutexGuard<'_, HashMap<String, RateLimitEntry>> {
    entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl RateLimitStore for MemoryStore {
    async fn increment(
        &self,
        identifier: &str,
        limit: u32,
        window: Duration,
    ) -> Result<RateLimitResult> {
        let now = Utc::now();
        let window = chrono::Duration::from_std(window)
            .unwrap_or_else(|_| chrono::Duration::seconds(60));

        let mut map = lock_entries(&self.entries);
        let entry = match map.get_mut(identifier) {
            // Inside the current window: bump the counter in place.
            Some(entry) if now <= entry.reset_time => {
                entry.count += 1;
                entry.clone()
            }
            // First request, or the window has passed: replace the entry.
            _ => {
                let fresh = RateLimitEntry {
                    count: 1,
                    reset_time: now + window,
                };
                map.insert(identifier.to_string(), fresh.clone());
                fresh
            }
        };
        drop(map);

        let allowed = entry.count <= limit;
        let retry_after = if allowed {
            None
        } else {
            Some((entry.reset_time - now).num_seconds().max(1) as u64)
        };

        Ok(RateLimitResult {
            allowed,
            limit,
            remaining: limit.saturating_sub(entry.count),
            reset: entry.reset_time,
            retry_after,
        })
    }

    fn name(&self) -> &'static str {
        "in-memory"
    }
}

// ============================================================================
// REDIS STORE
// ============================================================================

/// Sliding-window counter evaluated atomically server-side.
///
/// Admission weighs the previous window's count by how much of it still
/// overlaps the sliding window, then checks the estimate against the limit
/// before incrementing. Returns `{allowed, count}`.
const SLIDING_WINDOW_SCRIPT: &str = r#"
local current_key  = KEYS[1]
local previous_key = KEYS[2]
local limit        = tonumber(ARGV[1])
local now_ms       = tonumber(ARGV[2])
local window_ms    = tonumber(ARGV[3])

local current  = tonumber(redis.call("GET", current_key) or "0")
local previous = tonumber(redis.call("GET", previous_key) or "0")

local position = (now_ms % window_ms) / window_ms
local estimate = math.floor(previous * (1 - position)) + current

if estimate >= limit then
  return {0, current}
end

local count = redis.call("INCR", current_key)
if count == 1 then
  redis.call("PEXPIRE", current_key, window_ms * 2)
end
return {1, count}
"#;

/// Redis-backed store shared across gateway instances.
pub struct RedisStore {
    manager: ConnectionManager,
    key_prefix: String,
    script: redis::Script,
}

impl RedisStore {
    pub fn new(manager: ConnectionManager, key_prefix: impl Into<String>) -> Self {
        Self {
            manager,
            key_prefix: key_prefix.into(),
            script: redis::Script::new(SLIDING_WINDOW_SCRIPT),
        }
    }
}

#[async_trait]
impl RateLimitStore for RedisStore {
    async fn increment(
        &self,
        identifier: &str,
        limit: u32,
        window: Duration,
    ) -> Result<RateLimitResult> {
        let window_ms = window.as_millis().max(1) as i64;
        let now_ms = Utc::now().timestamp_millis();
        let current_window = now_ms / window_ms;

        let current_key = format!("{}:{}:{}", self.key_prefix, identifier, current_window);
        let previous_key = format!("{}:{}:{}", self.key_prefix, identifier, current_window - 1);

        let mut conn = self.manager.clone();
        let (allowed, count): (i64, i64) = self
            .script
            .key(&current_key)
            .key(&previous_key)
            .arg(limit)
            .arg(now_ms)
            .arg(window_ms)
            .invoke_async(&mut conn)
            .await?;

        let allowed = allowed == 1;
        let reset_ms = (current_window + 1) * window_ms;
        let reset = Utc
            .timestamp_millis_opt(reset_ms)
            .single()
            .unwrap_or_else(Utc::now);

        // A denial may come from the previous window's weight while the
        // current counter is low; the remaining quota is still zero.
        let (remaining, retry_after) = if allowed {
            (limit.saturating_sub(count.max(0) as u32), None)
        } else {
            (0, Some((((reset_ms - now_ms) / 1000).max(1)) as u64))
        };

        Ok(RateLimitResult {
            allowed,
            limit,
            remaining,
            reset,
            retry_after,
        })
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

// ============================================================================
// POLICY
// ============================================================================

/// Rate limit policy: applies the configured limit and window to whichever
/// store was selected at startup.
#[derive(Clone)]
pub struct RateLimiterService {
    store: Arc<dyn RateLimitStore>,
    config: RateLimitConfig,
}

impl RateLimiterService {
    pub fn new(store: Arc<dyn RateLimitStore>, config: RateLimitConfig) -> Self {
        Self { store, config }
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.name()
    }

    /// Evaluate the policy for one identifier, counting this request.
    pub async fn check(&self, identifier: &str) -> Result<RateLimitResult> {
        if !self.config.enabled {
            debug!(identifier, "Rate limiting disabled, allowing request");
            return Ok(RateLimitResult {
                allowed: true,
                limit: self.config.max_requests,
                remaining: self.config.max_requests,
                reset: Utc::now()
                    + chrono::Duration::from_std(self.config.window())
                        .unwrap_or_else(|_| chrono::Duration::seconds(60)),
                retry_after: None,
            });
        }

        let result = self
            .store
            .increment(identifier, self.config.max_requests, self.config.window())
            .await?;

        if !result.allowed {
            warn!(
                identifier,
                limit = result.limit,
                backend = self.store.name(),
                "Rate limit exceeded"
            );
        }

        Ok(result)
    }
}
