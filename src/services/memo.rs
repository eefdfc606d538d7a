//! Short-lived in-memory memo for repeated API lookups.

use dashmap::DashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

struct MemoEntry<V> {
    value: V,
    expires_at: Instant,
}

/// A thread-safe map whose entries expire after a fixed TTL.
pub struct Memo<K, V> {
    data: DashMap<K, MemoEntry<V>>,
    ttl: Duration,
}

impl<K: Eq + Hash, V: Clone> Memo<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            data: DashMap::new(),
            ttl,
        }
    }

    /// Get a live value; expired entries are dropped on read.
    pub fn get(&self, key: &K) -> Option<V> {
        let entry = self.data.get(key)?;
        if entry.expires_at > Instant::now() {
            Some(entry.value.clone())
        } else {
            drop(entry);
            self.data.remove(key);
            None
        }
    }

    pub fn insert(&self, key: K, value: V) {
        // A zero TTL disables memoization entirely.
        if self.ttl.is_zero() {
            return;
        }
        self.data.insert(
            key,
            MemoEntry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Remove all expired entries.
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.data.retain(|_, entry| entry.expires_at > now);
    }

    /// Number of entries, including expired ones not yet cleaned up.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
