// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::VecDeque;
use tracing::trace;

use crate::ids::DatasetVersion;
use crate::model::{ColumnSet, FilterCriteria, View};

pub const DEFAULT_CACHE_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewKey {
    pub version: DatasetVersion,
    pub filters: FilterCriteria,
    pub columns: ColumnSet,
}

impl ViewKey {
    pub fn new(version: DatasetVersion, filters: &FilterCriteria, columns: &ColumnSet) -> Self {
        Self {
            version,
            filters: filters.clone(),
            columns: columns.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Least-recently-used views, most recent at the front. A capacity of zero
/// disables caching.
#[derive(Debug, Clone)]
pub struct ViewCache {
    capacity: usize,
    entries: VecDeque<(ViewKey, View)>,
    hits: u64,
    misses: u64,
}

impl Default for ViewCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl ViewCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
            hits: 0,
            misses: 0,
        }
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&mut self, key: &ViewKey) -> Option<&View> {
        let Some(index) = self.entries.iter().position(|(cached, _)| cached == key) else {
            self.misses += 1;
            return None;
        };
        self.hits += 1;
        if index > 0
            && let Some(entry) = self.entries.remove(index)
        {
            self.entries.push_front(entry);
        }
        self.entries.front().map(|(_, view)| view)
    }

    pub fn insert(&mut self, key: ViewKey, view: View) {
        if self.capacity == 0 {
            return;
        }
        self.entries.retain(|(cached, _)| cached != &key);
        self.entries.push_front((key, view));
        while self.entries.len() > self.capacity {
            if let Some((evicted, _)) = self.entries.pop_back() {
                trace!(version = evicted.version.get(), "evicted cached view");
            }
        }
    }

    pub fn invalidate(&mut self) {
        if !self.entries.is_empty() {
            trace!(entries = self.entries.len(), "view cache invalidated");
        }
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
        }
    }
}
