//! The archive store: one SQLite connection, the table registry, and a
//! result cache invalidated when the database file changes on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::{Mutex, MutexGuard};
use rusqlite::Connection;

use crate::cache::{CacheKey, SearchCache};
use crate::error::StoreResult;
use crate::registry::{LogicalTable, SchemaRegistry};
use crate::search::{execute_search, normalize_query, normalize_sort, SearchRequest, SearchResults};

/// Default number of cached result sets.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Read access to an archive database.
///
/// The store is `Sync`: the connection and cache each sit behind a
/// mutex, so a shared reference can serve searches from multiple
/// threads. Another process may rewrite the database file between
/// searches; the store watches the file's modification time and drops
/// its cache when it moves.
pub struct Store {
    path: Option<PathBuf>,
    conn: Mutex<Connection>,
    registry: SchemaRegistry,
    cache: Mutex<SearchCache>,
    max_results: Option<usize>,
    last_modified: Mutex<Option<SystemTime>>,
}

impl Store {
    /// Opens the database at `path`. The file must already exist.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let modified = std::fs::metadata(&path)?.modified()?;
        let conn = Connection::open(&path)?;
        tracing::info!(path = %path.display(), "opened archive database");
        Ok(Self {
            path: Some(path),
            conn: Mutex::new(conn),
            registry: SchemaRegistry::new(),
            cache: Mutex::new(SearchCache::new(DEFAULT_CACHE_CAPACITY)),
            max_results: None,
            last_modified: Mutex::new(Some(modified)),
        })
    }

    /// Opens a fresh in-memory database. Used in tests and tooling;
    /// with no backing file the cache is never invalidated.
    pub fn in_memory() -> StoreResult<Self> {
        Ok(Self {
            path: None,
            conn: Mutex::new(Connection::open_in_memory()?),
            registry: SchemaRegistry::new(),
            cache: Mutex::new(SearchCache::new(DEFAULT_CACHE_CAPACITY)),
            max_results: None,
            last_modified: Mutex::new(None),
        })
    }

    /// Caps every search at `limit` rows unless the request carries its
    /// own limit.
    pub fn with_max_results(mut self, limit: usize) -> Self {
        self.max_results = Some(limit);
        self
    }

    /// Replaces the cache with one holding `capacity` result sets.
    pub fn with_cache_capacity(self, capacity: usize) -> Self {
        *self.cache.lock() = SearchCache::new(capacity);
        self
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Direct access to the underlying connection.
    pub fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }

    /// Searches `table`, serving repeated requests from the cache.
    pub fn search(
        &self,
        table: LogicalTable,
        request: &SearchRequest,
    ) -> StoreResult<Arc<SearchResults>> {
        self.refresh()?;

        let descriptor = self.registry.descriptor(table);
        let mut request = request.clone();
        request.query = normalize_query(&request.query);
        request.sort = Some(normalize_sort(descriptor, request.sort.as_deref()));
        if request.limit.is_none() {
            request.limit = self.max_results;
        }
        let order = request.order.unwrap_or(descriptor.default_order);

        let key: CacheKey = (
            table,
            request.query.clone(),
            request.sort.clone().unwrap_or_default(),
            order,
            request.limit,
        );
        if let Some(hit) = self.cache.lock().get(&key) {
            tracing::debug!(table = %table, query = %request.query, "search cache hit");
            return Ok(hit);
        }

        let results = {
            let conn = self.conn.lock();
            execute_search(&conn, descriptor, &request)?
        };
        let results = Arc::new(results);
        self.cache.lock().insert(key, Arc::clone(&results));
        Ok(results)
    }

    /// Drops every cached result set.
    pub fn invalidate(&self) {
        self.cache.lock().clear();
    }

    #[cfg(test)]
    pub(crate) fn cached_searches(&self) -> usize {
        self.cache.lock().len()
    }

    /// Drops the cache when the database file was rewritten since the
    /// last search.
    fn refresh(&self) -> StoreResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let modified = std::fs::metadata(path)?.modified()?;
        let mut last = self.last_modified.lock();
        if *last != Some(modified) {
            tracing::info!(path = %path.display(), "database file changed, dropping cached searches");
            self.cache.lock().clear();
            *last = Some(modified);
        }
        Ok(())
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.path)
            .field("max_results", &self.max_results)
            .finish_non_exhaustive()
    }
}
