//! Time-boxed key/value result cache
//!
//! A bounded map with a fixed TTL per cache instance. Entries expire lazily
//! on access and the oldest-inserted entry is evicted when the capacity
//! bound is exceeded. There is no background sweep; the store is small
//! enough that lazy expiry keeps it honest.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

/// Cache sizing and expiry configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Time-to-live for every entry in this instance
    pub ttl: Duration,
    /// Maximum number of entries held at once
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(5 * 60),
            max_entries: 50,
        }
    }
}

struct Entry<V> {
    value: V,
    stored_at: Instant,
}

struct Inner<V> {
    entries: HashMap<String, Entry<V>>,
    /// Keys in insertion order, for oldest-first eviction
    order: VecDeque<String>,
}

/// Generic bounded TTL cache
///
/// Cloneable values only; `get` hands back a copy so callers never hold the
/// lock. Concurrent access is serialized through a single RwLock, which is
/// sufficient for the request volumes a feed cache sees.
pub struct ResultCache<V: Clone> {
    config: CacheConfig,
    inner: RwLock<Inner<V>>,
}

impl<V: Clone> ResultCache<V> {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            inner: RwLock::new(Inner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Look up a key, treating expired entries as absent and removing them.
    pub async fn get(&self, key: &str) -> Option<V> {
        {
            let inner = self.inner.read().await;
            match inner.entries.get(key) {
                Some(entry) if entry.stored_at.elapsed() <= self.config.ttl => {
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        // Expired: upgrade to a write lock and drop the entry.
        let mut inner = self.inner.write().await;
        if let Some(entry) = inner.entries.get(key) {
            if entry.stored_at.elapsed() > self.config.ttl {
                inner.entries.remove(key);
                inner.order.retain(|k| k != key);
                debug!(key, "cache entry expired");
                return None;
            }
            return Some(entry.value.clone());
        }
        None
    }

    /// Insert or replace a value, evicting the oldest-inserted entry when
    /// the capacity bound is exceeded.
    pub async fn set(&self, key: &str, value: V) {
        let mut inner = self.inner.write().await;

        if inner.entries.contains_key(key) {
            inner.order.retain(|k| k != key);
        }
        inner.entries.insert(
            key.to_string(),
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
        inner.order.push_back(key.to_string());

        while inner.entries.len() > self.config.max_entries {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
                debug!(key = %oldest, "cache entry evicted (capacity)");
            } else {
                break;
            }
        }
    }

    /// Number of live-or-expired entries currently held
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }
}
