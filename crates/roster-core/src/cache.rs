//! In-memory read-through cache for resolved employees.
//!
//! Size-bounded (LRU) with expire-after-write. Empty lists are never stored, so a
//! transient upstream outage cannot be remembered as "there are no employees".

use std::sync::Arc;
use std::time::Duration;

use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use tracing::{debug, info};

use crate::types::Employee;

/// Cache key: the whole catalog or a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    All,
    Id(i64),
}

/// Cached resolution result.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    One(Employee),
    Many(Arc<[Employee]>),
}

impl CachedValue {
    fn is_empty_list(&self) -> bool {
        matches!(self, Self::Many(list) if list.is_empty())
    }
}

/// Read-through cache shared by all resolutions; cloning shares the storage.
#[derive(Clone)]
pub struct RecordCache {
    inner: Cache<CacheKey, CachedValue>,
}

impl std::fmt::Debug for RecordCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordCache")
            .field("entries", &self.inner.entry_count())
            .finish()
    }
}

impl RecordCache {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .eviction_policy(EvictionPolicy::lru())
            .build();
        Self { inner }
    }

    /// Look up a key. Expired entries read as absent.
    pub fn get(&self, key: &CacheKey) -> Option<CachedValue> {
        let hit = self.inner.get(key);
        debug!(key = ?key, hit = hit.is_some(), "cache lookup");
        hit
    }

    /// Store a value. No-op for an empty list.
    pub fn put(&self, key: CacheKey, value: CachedValue) {
        if value.is_empty_list() {
            debug!(key = ?key, "not caching empty result");
            return;
        }
        self.inner.insert(key, value);
    }

    /// Drop every entry, expired or not.
    pub fn evict_all(&self) {
        self.inner.invalidate_all();
        self.inner.run_pending_tasks();
        info!("employee cache cleared");
    }

    pub fn get_all(&self) -> Option<Vec<Employee>> {
        match self.get(&CacheKey::All)? {
            CachedValue::Many(list) => Some(list.to_vec()),
            CachedValue::One(_) => None,
        }
    }

    pub fn put_all(&self, employees: &[Employee]) {
        self.put(CacheKey::All, CachedValue::Many(Arc::from(employees)));
    }

    pub fn get_one(&self, id: i64) -> Option<Employee> {
        match self.get(&CacheKey::Id(id))? {
            CachedValue::One(employee) => Some(employee),
            CachedValue::Many(_) => None,
        }
    }

    pub fn put_one(&self, employee: Employee) {
        self.put(CacheKey::Id(employee.id), CachedValue::One(employee));
    }

    /// Approximate number of live entries.
    pub fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }
}
