//! Bounded cache for search results.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::registry::{LogicalTable, SortOrder};
use crate::search::SearchResults;

/// Identity of a cached search: table, normalized query, applied sort,
/// order, and row cap.
pub type CacheKey = (LogicalTable, String, String, SortOrder, Option<usize>);

/// Fixed-capacity cache with first-in-first-out eviction.
///
/// Results are shared behind `Arc` so hits hand out the stored rows
/// without cloning them.
#[derive(Debug)]
pub struct SearchCache {
    capacity: usize,
    entries: HashMap<CacheKey, Arc<SearchResults>>,
    arrival: VecDeque<CacheKey>,
}

impl SearchCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            arrival: VecDeque::with_capacity(capacity),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<SearchResults>> {
        self.entries.get(key).cloned()
    }

    pub fn insert(&mut self, key: CacheKey, results: Arc<SearchResults>) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.insert(key.clone(), results).is_none() {
            self.arrival.push_back(key);
            while self.entries.len() > self.capacity {
                if let Some(oldest) = self.arrival.pop_front() {
                    self.entries.remove(&oldest);
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.arrival.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
