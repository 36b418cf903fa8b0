//! Namespaced cache service for derived permission data.
//!
//! Cache entries are never authoritative: they are invalidatable projections
//! of the edge store, grouped into namespaces that can be cleared as a unit.
//! The permission store clears the whole `"permissions"` namespace on every
//! write rather than tracking which keys a given edge could affect.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;

use crate::error::Result;

/// Namespace holding cached permission lookups.
pub const PERMISSIONS_NAMESPACE: &str = "permissions";

/// A cached value with its creation timestamp.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cached payload.
    pub value: Value,
    /// When the entry was created.
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Create a new cache entry stamped with the current time.
    pub fn new(value: Value) -> Self {
        Self {
            value,
            created_at: Utc::now(),
        }
    }

    /// Check if the entry is expired based on TTL.
    pub fn is_expired(&self, ttl_seconds: u64) -> bool {
        let age = Utc::now().signed_duration_since(self.created_at);
        age.num_seconds() >= ttl_seconds as i64
    }
}

/// A cache service with namespace-scoped clearing.
///
/// All operations are fallible so that backends living outside the process
/// can report unavailability; callers on the authoritative write path treat
/// such failures as best-effort.
pub trait CacheService: Send + Sync {
    /// Write a value under a key within a namespace.
    fn write(&self, key: &str, value: Value, namespace: &str) -> Result<()>;

    /// Read a value, or `None` when absent or expired.
    fn read(&self, key: &str, namespace: &str) -> Result<Option<Value>>;

    /// Delete a single key, returning whether it existed.
    fn delete(&self, key: &str, namespace: &str) -> Result<bool>;

    /// Remove every entry in a namespace, returning how many were dropped.
    fn clear_namespace(&self, namespace: &str) -> Result<usize>;
}

/// In-process cache implementation using DashMap for thread safety.
#[derive(Debug)]
pub struct MemoryCache {
    // (namespace, key) -> entry
    entries: DashMap<(String, String), CacheEntry>,
    ttl_seconds: u64,
}

impl MemoryCache {
    /// Create a cache with the given entry TTL.
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            entries: DashMap::new(),
            ttl_seconds,
        }
    }

    /// Number of live entries across all namespaces.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of entries within one namespace.
    pub fn namespace_len(&self, namespace: &str) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.key().0 == namespace)
            .count()
    }

    /// Drop expired entries eagerly.
    pub fn cleanup_expired(&self) {
        let expired: Vec<_> = self
            .entries
            .iter()
            .filter(|entry| entry.value().is_expired(self.ttl_seconds))
            .map(|entry| entry.key().clone())
            .collect();

        for key in expired {
            self.entries.remove(&key);
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(300)
    }
}

impl CacheService for MemoryCache {
    fn write(&self, key: &str, value: Value, namespace: &str) -> Result<()> {
        self.entries.insert(
            (namespace.to_string(), key.to_string()),
            CacheEntry::new(value),
        );
        Ok(())
    }

    fn read(&self, key: &str, namespace: &str) -> Result<Option<Value>> {
        let map_key = (namespace.to_string(), key.to_string());
        if let Some(entry) = self.entries.get(&map_key) {
            if !entry.is_expired(self.ttl_seconds) {
                return Ok(Some(entry.value.clone()));
            }
            drop(entry);
            self.entries.remove(&map_key);
        }
        Ok(None)
    }

    fn delete(&self, key: &str, namespace: &str) -> Result<bool> {
        Ok(self
            .entries
            .remove(&(namespace.to_string(), key.to_string()))
            .is_some())
    }

    fn clear_namespace(&self, namespace: &str) -> Result<usize> {
        let keys: Vec<_> = self
            .entries
            .iter()
            .filter(|entry| entry.key().0 == namespace)
            .map(|entry| entry.key().clone())
            .collect();

        let count = keys.len();
        for key in keys {
            self.entries.remove(&key);
        }
        Ok(count)
    }
}
