//! Per-category snapshot cache.
//!
//! Holds the first pages of recently browsed categories so switching back to
//! one of them does not hit the network. Entries expire after a fixed TTL and
//! the cache keeps at most `max_entries` of them, dropping the oldest by
//! insertion order when a new key arrives.
//!
//! Snapshots only ever hold whole pages, so `next_offset` is always the
//! provider offset right after the last cached page.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

use crate::config::CacheConfig;
use crate::models::{Category, ContentItem, ContentKind, ContentPage};

/// Source of the current time for expiry checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Cache key: `(kind, title, tag)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: Option<ContentKind>,
    pub title: String,
    pub tag: Option<String>,
}

impl CacheKey {
    pub fn for_category(category: &Category) -> Self {
        Self {
            kind: category.kind,
            title: category.title.clone(),
            tag: category.tag.clone(),
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = self.kind.map(|k| k.as_str()).unwrap_or("unknown");
        write!(f, "{kind}-{}-{}", self.title, self.tag.as_deref().unwrap_or(""))
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub items: Vec<ContentItem>,
    pub cached_at: DateTime<Utc>,
    pub kind: Option<ContentKind>,
    pub has_more: bool,
    /// Provider offset of the first row not in `items`.
    pub next_offset: usize,
    /// A page did not fit under the item cap; no further pages are appended.
    pub sealed: bool,
}

/// Bounded, time-limited cache of category pages.
pub struct CategoryCache {
    entries: VecDeque<(CacheKey, CacheEntry)>,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
}

impl CategoryCache {
    pub fn new(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: VecDeque::with_capacity(config.max_entries),
            config,
            clock,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.position(key).is_some()
    }

    fn position(&self, key: &CacheKey) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    fn is_valid(&self, entry: &CacheEntry) -> bool {
        self.clock.now() - entry.cached_at < self.config.ttl()
    }

    /// Look up a live entry. An expired entry is removed and reported as a miss.
    pub fn get_valid(&mut self, key: &CacheKey) -> Option<&CacheEntry> {
        let idx = self.position(key)?;
        if !self.is_valid(&self.entries[idx].1) {
            tracing::debug!(%key, "Cache entry expired");
            self.entries.remove(idx);
            return None;
        }
        Some(&self.entries[idx].1)
    }

    /// Peek without checking expiry.
    pub fn get(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.position(key).map(|idx| &self.entries[idx].1)
    }

    /// Drop every expired entry.
    pub fn purge_expired(&mut self) {
        let now = self.clock.now();
        let ttl = self.config.ttl();
        let before = self.entries.len();
        self.entries.retain(|(_, e)| now - e.cached_at < ttl);
        let purged = before - self.entries.len();
        if purged > 0 {
            tracing::debug!(purged, "Purged expired cache entries");
        }
    }

    /// Store the first page of a category, replacing any previous snapshot.
    ///
    /// Expired entries are purged first. A new key arriving at capacity
    /// evicts the oldest entry; a replaced key keeps its position. A page
    /// larger than the per-entry cap is not cached.
    pub fn put_first_page(
        &mut self,
        key: CacheKey,
        kind: Option<ContentKind>,
        page: &ContentPage,
    ) {
        self.purge_expired();

        if page.items.len() > self.config.max_items_per_entry {
            tracing::debug!(%key, count = page.items.len(), "Page exceeds cache entry cap");
            if let Some(idx) = self.position(&key) {
                self.entries.remove(idx);
            }
            return;
        }

        let entry = CacheEntry {
            items: page.items.clone(),
            cached_at: self.clock.now(),
            kind,
            has_more: !page.is_exhausted(),
            next_offset: page.fetched,
            sealed: false,
        };

        if let Some(idx) = self.position(&key) {
            self.entries[idx].1 = entry;
            return;
        }

        if self.entries.len() >= self.config.max_entries {
            if let Some((evicted, _)) = self.entries.pop_front() {
                tracing::debug!(key = %evicted, "Evicted oldest cache entry");
            }
        }
        if self.config.max_entries > 0 {
            self.entries.push_back((key, entry));
        }
    }

    /// Append a later page to an existing snapshot.
    ///
    /// Does nothing if the key is absent or the snapshot is sealed. A page
    /// that would push the snapshot past the item cap seals it instead.
    pub fn append_page(&mut self, key: &CacheKey, page: &ContentPage) {
        let cap = self.config.max_items_per_entry;
        let Some(idx) = self.position(key) else {
            return;
        };
        let entry = &mut self.entries[idx].1;
        if entry.sealed {
            return;
        }
        if entry.items.len() + page.items.len() > cap {
            entry.sealed = true;
            return;
        }
        entry.items.extend(page.items.iter().cloned());
        entry.next_offset += page.fetched;
        entry.has_more = !page.is_exhausted();
    }
}
