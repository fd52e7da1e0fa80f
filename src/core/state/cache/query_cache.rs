use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::core::state::cache::query_key::QueryKey;
use crate::domain::log::model::LogPage;

#[derive(Debug, Clone)]
struct CacheEntry {
    page: Arc<LogPage>,
    stored_at: DateTime<Utc>,
}

pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Explicit page cache handed to the query orchestrator.
///
/// Entries older than `ttl` count as misses and are dropped on the next
/// insert. At most `capacity` pages are held; the oldest goes first.
#[derive(Debug, Clone)]
pub struct QueryCache {
    entries: HashMap<QueryKey, CacheEntry>,
    ttl: Option<Duration>,
    capacity: usize,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(None)
    }
}

impl QueryCache {
    /// `None` keeps entries until explicitly invalidated.
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            capacity: DEFAULT_CACHE_CAPACITY,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub fn get(&self, key: &QueryKey) -> Option<Arc<LogPage>> {
        self.get_at(key, Utc::now())
    }

    pub fn get_at(&self, key: &QueryKey, now: DateTime<Utc>) -> Option<Arc<LogPage>> {
        let entry = self.entries.get(key)?;

        if let Some(ttl) = self.ttl {
            if now - entry.stored_at > ttl {
                debug!(key = %key, "Cache entry expired");
                return None;
            }
        }

        Some(entry.page.clone())
    }

    pub fn insert(&mut self, key: QueryKey, page: Arc<LogPage>) {
        self.insert_at(key, page, Utc::now());
    }

    pub fn insert_at(&mut self, key: QueryKey, page: Arc<LogPage>, now: DateTime<Utc>) {
        self.evict_expired(now);
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_oldest();
        }
        self.entries.insert(
            key,
            CacheEntry {
                page,
                stored_at: now,
            },
        );
    }

    pub fn invalidate(&mut self, key: &QueryKey) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drop every page cached for `project_id`. Returns how many were removed.
    pub fn invalidate_scope(&mut self, project_id: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|k, _| k.project_id != project_id);
        before - self.entries.len()
    }

    /// Drop expired entries. Returns how many were removed.
    pub fn evict_expired(&mut self, now: DateTime<Utc>) -> usize {
        let Some(ttl) = self.ttl else {
            return 0;
        };
        let before = self.entries.len();
        self.entries.retain(|_, e| now - e.stored_at <= ttl);
        before - self.entries.len()
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, e)| e.stored_at)
            .map(|(k, _)| k.clone());
        if let Some(key) = oldest {
            debug!(key = %key, "Cache full; evicting oldest page");
            self.entries.remove(&key);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
