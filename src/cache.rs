//! In-memory cache for upstream API responses.
//!
//! Entries only remember when they were stored. Freshness is decided by the
//! reader against the TTL it passes in, so the same key can be read under
//! different TTLs by different callers.

use dashmap::DashMap;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// TTL for ordinary catalog responses.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);
/// TTL for configuration-like data (genre tables, provider lists).
pub const CONFIG_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    stored_at: Instant,
}

/// Process-wide response cache. Cloning yields another handle to the same map.
#[derive(Debug, Clone, Default)]
pub struct ResponseCache {
    entries: Arc<DashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value together with its age.
    pub fn get(&self, key: &str) -> Option<(Value, Duration)> {
        self.entries
            .get(key)
            .map(|entry| (entry.value.clone(), entry.stored_at.elapsed()))
    }

    /// Returns the cached value only while `age < ttl`.
    pub fn get_fresh(&self, key: &str, ttl: Duration) -> Option<Value> {
        match self.get(key) {
            Some((value, age)) if age < ttl => {
                debug!(key, age_secs = age.as_secs(), "cache hit");
                Some(value)
            }
            Some(_) => {
                debug!(key, "cache entry stale");
                None
            }
            None => {
                debug!(key, "cache miss");
                None
            }
        }
    }

    /// Stores `value`, replacing any previous entry for `key` wholesale.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Upstream query parameters. Keys stay sorted and absent values are never
/// stored, so two equivalent requests always produce the same cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(BTreeMap<String, String>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, value: impl Display) -> Self {
        self.0.insert(key.to_string(), value.to_string());
        self
    }

    pub fn set_opt<T: Display>(self, key: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.set(key, v),
            None => self,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn pairs(&self) -> Vec<(&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
    }
}

/// Builds the cache key for a request: namespace, endpoint and the sorted
/// parameters as a JSON object. Keys and values are JSON-escaped, so a value
/// containing `&` or `=` cannot pass for a second parameter.
pub fn cache_key(namespace: &str, endpoint: &str, params: &Params) -> String {
    let query: serde_json::Map<String, Value> = params
        .0
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    format!("{namespace}:{endpoint}?{}", Value::Object(query))
}
