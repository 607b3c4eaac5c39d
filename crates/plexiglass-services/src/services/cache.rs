//! Cache Service
//!
//! TTL cache for expensive remote queries (server identity, library lists,
//! session lists).
//!
//! Key Principles:
//! - Expired entries are treated as absent and evicted lazily on access
//! - `size()` and `get_stats()` sweep first, so counts never include dead entries
//! - Every `get` counts as exactly one hit or one miss
//! - Concurrent misses on the same key in `get_or_compute` run the factory once

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::time::Instant;
use tracing::{debug, trace};

use plexiglass_core::PerformanceSettings;

/// Default time-to-live (60 seconds)
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Length of keys produced by [`make_key`]
const KEY_LENGTH: usize = 32;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    created_at: Instant,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            value,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug)]
struct CacheState<V> {
    entries: HashMap<String, CacheEntry<V>>,
    hits: u64,
    misses: u64,
}

impl<V: Clone> CacheState<V> {
    /// Live value for `key`; evicts the entry if it expired
    fn lookup(&mut self, key: &str) -> Option<V> {
        let now = Instant::now();
        let expired = self.entries.get(key)?.is_expired(now);
        if expired {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Drop every expired entry
    fn sweep(&mut self) {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - self.entries.len();
        if removed > 0 {
            trace!("[CacheService] Swept {} expired entries", removed);
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    /// `hits / (hits + misses)`, 0.0 before any request
    pub hit_rate: f64,
}

/// Thread-safe TTL cache.
///
/// Values are cloned out on read; store `Arc`s for large payloads.
pub struct CacheService<V = Value> {
    default_ttl: Duration,
    state: Mutex<CacheState<V>>,
    /// Per-key guards for `get_or_compute`
    in_flight: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
}

impl<V: Clone> CacheService<V> {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            default_ttl,
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                hits: 0,
                misses: 0,
            }),
            in_flight: DashMap::new(),
        }
    }

    /// Create a cache using `performance.cache_ttl` as the default TTL
    pub fn from_settings(settings: &PerformanceSettings) -> Self {
        Self::new(settings.cache_ttl())
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Store `value` under `key`, replacing any existing entry
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.default_ttl);
        let key = key.into();
        trace!("[CacheService] Set {} (ttl {:?})", key, ttl);
        self.state
            .lock()
            .entries
            .insert(key, CacheEntry::new(value, ttl));
    }

    /// Live value for `key`, counting one hit or one miss
    pub fn get(&self, key: &str) -> Option<V> {
        let mut state = self.state.lock();
        match state.lookup(key) {
            Some(value) => {
                state.hits += 1;
                Some(value)
            }
            None => {
                state.misses += 1;
                None
            }
        }
    }

    /// Whether `key` holds a live value; does not touch the counters
    pub fn has(&self, key: &str) -> bool {
        self.state.lock().lookup(key).is_some()
    }

    /// Time since the live entry under `key` was stored
    pub fn age(&self, key: &str) -> Option<Duration> {
        let state = self.state.lock();
        let now = Instant::now();
        state
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| now.duration_since(entry.created_at))
    }

    /// Return the cached value or compute, store and return it.
    ///
    /// Concurrent callers missing the same key wait for the first caller's
    /// factory instead of running their own. Factory errors propagate and
    /// nothing is stored.
    pub async fn get_or_compute<F, Fut, E>(
        &self,
        key: &str,
        factory: F,
        ttl: Option<Duration>,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        let lock = self
            .in_flight
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .value()
            .clone();
        let _held = lock.lock().await;
        // Must drop before `_held`
        let _in_flight = InFlight {
            map: &self.in_flight,
            key,
            lock: &lock,
        };

        // A concurrent caller may have filled the entry while we waited
        let cached = self.state.lock().lookup(key);
        if let Some(value) = cached {
            debug!("[CacheService] {} computed by concurrent caller", key);
            return Ok(value);
        }

        let result = factory().await;
        if let Ok(ref value) = result {
            self.set(key, value.clone(), ttl);
        }
        result
    }

    /// Remove `key` if present
    pub fn delete(&self, key: &str) {
        self.state.lock().entries.remove(key);
    }

    /// Remove every entry and reset the hit/miss counters
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.hits = 0;
        state.misses = 0;
        debug!("[CacheService] Cleared");
    }

    /// Number of live entries
    pub fn size(&self) -> usize {
        let mut state = self.state.lock();
        state.sweep();
        state.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Remove every key starting with `prefix`; returns how many were removed
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut state = self.state.lock();
        let before = state.entries.len();
        state.entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before - state.entries.len();
        debug!(
            "[CacheService] Invalidated {} entries with prefix '{}'",
            removed, prefix
        );
        removed
    }

    /// Remove every key matching a shell-style glob (`*`, `?`, `[...]`)
    pub fn invalidate_pattern(&self, pattern: &str) -> Result<usize, glob::PatternError> {
        let matcher = glob::Pattern::new(pattern)?;
        let mut state = self.state.lock();
        let before = state.entries.len();
        state.entries.retain(|key, _| !matcher.matches(key));
        let removed = before - state.entries.len();
        debug!(
            "[CacheService] Invalidated {} entries matching '{}'",
            removed, pattern
        );
        Ok(removed)
    }

    pub fn get_stats(&self) -> CacheStats {
        let mut state = self.state.lock();
        state.sweep();

        let total = state.hits + state.misses;
        let hit_rate = if total > 0 {
            state.hits as f64 / total as f64
        } else {
            0.0
        };

        CacheStats {
            size: state.entries.len(),
            hits: state.hits,
            misses: state.misses,
            hit_rate,
        }
    }
}

/// Removes a key's in-flight lock on drop, unless a newer one replaced it
struct InFlight<'a> {
    map: &'a DashMap<String, Arc<tokio::sync::Mutex<()>>>,
    key: &'a str,
    lock: &'a Arc<tokio::sync::Mutex<()>>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.map
            .remove_if(self.key, |_, current| Arc::ptr_eq(current, self.lock));
    }
}

impl<V: Clone> Default for CacheService<V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

/// Derive a deterministic cache key.
///
/// Positional parts keep their order, named parts are sorted by name. Both
/// go into separate sections of one JSON document, which is hashed with
/// SHA-256 and truncated to 32 hex characters.
pub fn make_key(parts: &[Value], named: &[(&str, Value)]) -> String {
    let args: Vec<Value> = parts.iter().cloned().map(canonicalize).collect();

    let mut sorted: Vec<&(&str, Value)> = named.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let kwargs: Vec<Value> = sorted
        .into_iter()
        .map(|(name, value)| Value::Array(vec![Value::from(*name), canonicalize(value.clone())]))
        .collect();

    let mut document = serde_json::Map::new();
    document.insert("args".to_string(), Value::Array(args));
    document.insert("kwargs".to_string(), Value::Array(kwargs));

    // A `Value` tree always renders
    let rendered = Value::Object(document).to_string();
    let digest = Sha256::digest(rendered.as_bytes());
    let mut key = hex::encode(digest);
    key.truncate(KEY_LENGTH);
    key
}

/// Builder over [`make_key`] for serializable arguments.
///
/// Adding an argument fails when it cannot be represented as JSON (for
/// example a map with non-string keys), so distinct arguments never
/// collapse into the same key.
#[derive(Debug, Default, Clone)]
pub struct CacheKey {
    parts: Vec<Value>,
    named: Vec<(String, Value)>,
}

impl CacheKey {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn part<T: Serialize>(mut self, value: T) -> serde_json::Result<Self> {
        self.parts.push(serde_json::to_value(value)?);
        Ok(self)
    }

    pub fn named<T: Serialize>(
        mut self,
        name: impl Into<String>,
        value: T,
    ) -> serde_json::Result<Self> {
        self.named.push((name.into(), serde_json::to_value(value)?));
        Ok(self)
    }

    pub fn build(&self) -> String {
        let named: Vec<(&str, Value)> = self
            .named
            .iter()
            .map(|(name, value)| (name.as_str(), value.clone()))
            .collect();
        make_key(&self.parts, &named)
    }
}

/// Sort object keys recursively so map insertion order never affects the key
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, canonicalize(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}
