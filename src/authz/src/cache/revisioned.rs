//! Revision-keyed snapshot cache

use super::snapshot::{CachedResource, Revisioned};
use crate::resource::Resource;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Default maximum number of cached snapshots
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

#[derive(Debug, Clone)]
struct CacheEntry {
    snapshot: Arc<CachedResource>,
    cached_at: Instant,
}

/// Snapshot cache kept consistent with the store through per-resource revisions
///
/// Writers call [`SnapshotCache::invalidate`] after changing a resource, which
/// advances its revision. A cached snapshot is served only while its revision
/// equals the current one; anything older is dropped on read and rebuilt from
/// the store on the next load.
pub struct SnapshotCache {
    entries: Arc<DashMap<String, CacheEntry>>,
    revisions: Arc<DashMap<String, u64>>,
    max_entries: usize,
    stats: Arc<DashMap<String, usize>>,
}

impl SnapshotCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            revisions: Arc::new(DashMap::new()),
            max_entries: max_entries.max(1),
            stats: Arc::new(DashMap::new()),
        }
    }

    /// Current revision of a resource; 0 until first invalidated
    pub fn current_revision(&self, id: &str) -> u64 {
        self.revisions.get(id).map(|r| *r).unwrap_or(0)
    }

    /// Advance the revision of a resource and drop its snapshot
    pub fn invalidate(&self, id: &str) -> u64 {
        let revision = {
            let mut entry = self.revisions.entry(id.to_string()).or_insert(0);
            *entry += 1;
            *entry
        };
        self.entries.remove(id);
        debug!("Invalidated resource={} revision={}", id, revision);
        revision
    }

    /// Snapshot at the current revision, if cached
    pub fn get(&self, id: &str) -> Option<Arc<CachedResource>> {
        let current = self.current_revision(id);

        if let Some(entry) = self.entries.get(id) {
            if entry.snapshot.revision() == current {
                self.increment_stat("hits");
                return Some(Arc::clone(&entry.snapshot));
            }
            drop(entry);
            self.entries.remove(id);
            self.increment_stat("stale");
        }

        self.increment_stat("misses");
        None
    }

    /// Publish a snapshot of `resource` stamped with the current revision
    ///
    /// A snapshot already cached at the same or a newer revision is kept.
    pub fn put(&self, resource: &Resource) -> Arc<CachedResource> {
        self.put_at(resource, self.current_revision(&resource.id))
    }

    /// Publish a snapshot of `resource` as read at `loaded_revision`
    ///
    /// When the resource was invalidated after it was read, the snapshot is
    /// returned to the caller but not cached.
    pub fn put_at(&self, resource: &Resource, loaded_revision: u64) -> Arc<CachedResource> {
        let current = self.current_revision(&resource.id);
        if current > loaded_revision {
            debug!(
                "Skipped caching resource={} loaded at revision={} current={}",
                resource.id, loaded_revision, current
            );
            self.increment_stat("stale");
            return Arc::new(CachedResource::new(loaded_revision, resource));
        }

        if let Some(existing) = self.entries.get(&resource.id) {
            if existing.snapshot.revision() >= loaded_revision {
                return Arc::clone(&existing.snapshot);
            }
        }

        if self.entries.len() >= self.max_entries {
            self.evict_oldest();
        }

        let snapshot = Arc::new(CachedResource::new(loaded_revision, resource));
        self.entries.insert(
            resource.id.clone(),
            CacheEntry {
                snapshot: Arc::clone(&snapshot),
                cached_at: Instant::now(),
            },
        );
        snapshot
    }

    /// Cached snapshot, or one built from `load` when absent or stale
    ///
    /// The revision is read before `load` runs, so a write invalidated while
    /// loading never publishes the old value under the new revision.
    pub fn get_or_load<F>(&self, id: &str, load: F) -> Option<Arc<CachedResource>>
    where
        F: FnOnce() -> Option<Resource>,
    {
        if let Some(snapshot) = self.get(id) {
            return Some(snapshot);
        }
        let revision = self.current_revision(id);
        load().map(|resource| self.put_at(&resource, revision))
    }

    pub fn clear(&self) {
        self.entries.clear();
        self.stats.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.get_stat("hits"),
            misses: self.get_stat("misses"),
            stale: self.get_stat("stale"),
            evictions: self.get_stat("evictions"),
            entries: self.entries.len(),
            max_entries: self.max_entries,
        }
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.cached_at)
            .map(|entry| entry.key().clone());

        if let Some(id) = oldest {
            self.entries.remove(&id);
            self.increment_stat("evictions");
        }
    }

    fn increment_stat(&self, key: &str) {
        self.stats
            .entry(key.to_string())
            .and_modify(|count| *count += 1)
            .or_insert(1);
    }

    fn get_stat(&self, key: &str) -> usize {
        self.stats.get(key).map(|v| *v).unwrap_or(0)
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub stale: usize,
    pub evictions: usize,
    pub entries: usize,
    pub max_entries: usize,
}

impl CacheStats {
    /// Calculate cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
