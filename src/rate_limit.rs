//! Fixed-Window Rate Limiting
//!
//! Counts requests per caller-supplied key in fixed windows. The first request for
//! a key opens a window of `window` length; requests inside it are allowed until
//! `limit` is reached, after which the key is denied until the window closes.
//!
//! Every call site chooses its own `limit` and `window`, so a single limiter can
//! back several policies as long as their keys are namespaced (`login:...`,
//! `reset:...`).
//!
//! # Storage
//!
//! Records live in a [`RateLimitStore`]. [`MemoryRateLimitStore`] keeps them in a
//! process-local map, so horizontally scaled deployments enforce per-instance
//! limits. Other backends implement the trait.
//!
//! Expired records are ignored on read but stay in the store until overwritten or
//! swept with [`RateLimiter::purge_expired`]. Nothing sweeps in the background.
//!
//! # Boundary behavior
//!
//! A caller can spend `limit` at the end of one window and `limit` again at the
//! start of the next, so up to `2 × limit` requests can land in any
//! window-length interval that spans a boundary.
//!
//! # Usage
//!
//! ```
//! use std::time::Duration;
//! use vestibule::RateLimiter;
//!
//! let limiter = RateLimiter::in_memory();
//! let window = Duration::from_secs(60);
//!
//! for _ in 0..5 {
//!     assert!(limiter.consume("login:203.0.113.7:ada@example.com", 5, window).allowed);
//! }
//! let denied = limiter.consume("login:203.0.113.7:ada@example.com", 5, window);
//! assert!(!denied.allowed);
//! assert!(denied.retry_after_secs.is_some());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::clock::{duration_millis, Clock, SystemClock};
use crate::observability::SecurityEvent;

// ============================================================================
// Records and Storage
// ============================================================================

/// Request count for one key in its current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRecord {
    /// Requests allowed in this window
    pub count: u32,
    /// Window end, milliseconds since the Unix epoch
    pub expires_at: i64,
}

impl RateLimitRecord {
    /// Whether the window has closed at `now_millis`
    pub fn is_expired(&self, now_millis: i64) -> bool {
        now_millis >= self.expires_at
    }
}

/// Storage backend for rate limit records.
///
/// [`update`](Self::update) must run its closure atomically with respect to every
/// other call touching the same key, including calls from other [`RateLimiter`]s
/// sharing the store. The limiter relies on it for its read-check-write step.
pub trait RateLimitStore: Send + Sync {
    /// Record for `key`, expired or not
    fn get(&self, key: &str) -> Option<RateLimitRecord>;

    /// Insert or replace the record for `key`
    fn set(&self, key: &str, record: RateLimitRecord);

    /// Drop the record for `key`
    fn remove(&self, key: &str);

    /// Read the record for `key`, pass it to `apply`, and store what `apply`
    /// returns as one atomic step. `None` leaves the stored record untouched.
    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<RateLimitRecord>) -> Option<RateLimitRecord>,
    );

    /// Drop every record expired at `now_millis`, returning how many were removed
    fn purge_expired(&self, now_millis: i64) -> usize;
}

/// Process-local [`RateLimitStore`] backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryRateLimitStore {
    records: Mutex<HashMap<String, RateLimitRecord>>,
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, including expired ones
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl RateLimitStore for MemoryRateLimitStore {
    fn get(&self, key: &str) -> Option<RateLimitRecord> {
        self.records.lock().get(key).copied()
    }

    fn set(&self, key: &str, record: RateLimitRecord) {
        self.records.lock().insert(key.to_string(), record);
    }

    fn remove(&self, key: &str) {
        self.records.lock().remove(key);
    }

    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<RateLimitRecord>) -> Option<RateLimitRecord>,
    ) {
        let mut records = self.records.lock();
        if let Some(record) = apply(records.get(key).copied()) {
            records.insert(key.to_string(), record);
        }
    }

    fn purge_expired(&self, now_millis: i64) -> usize {
        let mut records = self.records.lock();
        let before = records.len();
        records.retain(|_, record| !record.is_expired(now_millis));
        before - records.len()
    }
}

// ============================================================================
// Decision
// ============================================================================

/// Outcome of [`RateLimiter::consume`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Requests left in the current window
    pub remaining: u32,
    /// Whole seconds until the window closes; set only when denied
    pub retry_after_secs: Option<u64>,
    /// Window end, milliseconds since the Unix epoch
    pub reset_at: i64,
}

impl RateLimitDecision {
    fn allow(remaining: u32, reset_at: i64) -> Self {
        Self {
            allowed: true,
            remaining,
            retry_after_secs: None,
            reset_at,
        }
    }

    fn deny(now_millis: i64, reset_at: i64) -> Self {
        Self {
            allowed: false,
            remaining: 0,
            retry_after_secs: Some(ceil_secs(reset_at - now_millis)),
            reset_at,
        }
    }
}

fn ceil_secs(millis: i64) -> u64 {
    let millis = millis.max(0) as u64;
    millis.div_ceil(1000)
}

// ============================================================================
// Limiter
// ============================================================================

/// Fixed-window request counter over a [`RateLimitStore`].
///
/// Cheap to clone; clones share the store and clock. Limiters built over the
/// same store share counters.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter").finish_non_exhaustive()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl RateLimiter {
    /// Limiter over `store`, reading the wall clock
    pub fn new(store: Arc<dyn RateLimitStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
        }
    }

    /// Limiter over a fresh [`MemoryRateLimitStore`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryRateLimitStore::new()))
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Count one request against `key`.
    ///
    /// A denied request is not counted. A `limit` of zero denies every request
    /// without opening a window.
    pub fn consume(&self, key: &str, limit: u32, window: Duration) -> RateLimitDecision {
        let now = self.clock.now_millis();

        if limit == 0 {
            let reset_at = now.saturating_add(duration_millis(window));
            return self.denied(key, limit, RateLimitDecision::deny(now, reset_at));
        }

        let mut decision = RateLimitDecision::deny(now, now);
        self.store.update(key, &mut |current| match current {
            Some(record) if !record.is_expired(now) => {
                if record.count >= limit {
                    decision = RateLimitDecision::deny(now, record.expires_at);
                    return None;
                }

                let count = record.count + 1;
                decision = RateLimitDecision::allow(limit - count, record.expires_at);
                Some(RateLimitRecord {
                    count,
                    expires_at: record.expires_at,
                })
            }
            _ => {
                let expires_at = now.saturating_add(duration_millis(window));
                decision = RateLimitDecision::allow(limit - 1, expires_at);
                Some(RateLimitRecord { count: 1, expires_at })
            }
        });

        if decision.allowed {
            decision
        } else {
            self.denied(key, limit, decision)
        }
    }

    /// Forget the counter for `key`
    pub fn reset(&self, key: &str) {
        self.store.remove(key);
    }

    /// Drop expired records from the store, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let removed = self.store.purge_expired(self.clock.now_millis());
        if removed > 0 {
            tracing::debug!(removed, "Purged expired rate limit records");
        }
        removed
    }

    fn denied(&self, key: &str, limit: u32, decision: RateLimitDecision) -> RateLimitDecision {
        crate::security_event!(
            SecurityEvent::RateLimitExceeded,
            key = %key,
            limit,
            retry_after_secs = decision.retry_after_secs.unwrap_or_default(),
            "Rate limit exceeded"
        );
        decision
    }
}

// ============================================================================
// Tests
// ============================================================================
