//! SQLite-backed symbol tags store
//!
//! This module provides the persistent tags index:
//! - One session owns one connection to one database file
//! - Schema creation is idempotent and runs on every (re)open
//! - Per-file batches are replaced atomically by the mutation pipeline
//! - Retrieval goes through a result cache invalidated on every mutation
//!
//! The store is advisory and rebuildable. Query failures degrade to empty
//! results and are logged; an I/O or corruption signature triggers a single
//! synchronous reopen of the same file.

mod builder;
mod cache;
mod error;
mod materialize;
mod mutation;
mod queries;
mod schema;
mod types;

pub use error::{MutationResult, OpenResult, StoreError};
pub use schema::TAGS_DB_VERSION;
pub use types::*;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{params_from_iter, Connection};
use tracing::{debug, trace, warn};

use self::builder::SqlQuery;
use self::cache::ResultCache;
use self::materialize::tag_from_row;
use crate::core::tag::TagEntry;

/// The tags store backed by SQLite
pub struct SqliteTagsStore {
    conn: Option<Connection>,
    path: Option<PathBuf>,
    options: StoreOptions,
    cache: ResultCache,
}

impl std::fmt::Debug for SqliteTagsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteTagsStore")
            .field("path", &self.path)
            .field("options", &self.options)
            .field("cached_queries", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl Default for SqliteTagsStore {
    fn default() -> Self {
        Self::new(StoreOptions::default())
    }
}

impl SqliteTagsStore {
    /// Create a session that is not yet open on any file
    pub fn new(options: StoreOptions) -> Self {
        Self {
            conn: None,
            path: None,
            options,
            cache: ResultCache::default(),
        }
    }

    /// Create a session and open it on `path`
    pub fn open_path(path: impl AsRef<Path>, options: StoreOptions) -> Result<Self, StoreError> {
        let mut store = Self::new(options);
        store.open(path)?;
        Ok(store)
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Open the store on `path`.
    ///
    /// A no-op when already open on the same path. When open on another
    /// file, the old connection is closed first; if the new file cannot be
    /// opened the previous one is reopened so the session keeps its prior
    /// state.
    pub fn open(&mut self, path: impl AsRef<Path>) -> OpenResult {
        let path = path.as_ref();
        if self.conn.is_some() && self.path.as_deref() == Some(path) {
            return Ok(());
        }

        let previous = self.path.clone();
        if self.conn.is_some() {
            debug!("switching tags database to {}", path.display());
            self.close();
        }

        match self.connect(path) {
            Ok(conn) => {
                self.conn = Some(conn);
                self.path = Some(path.to_path_buf());
                Ok(())
            }
            Err(err) => {
                warn!("Failed to open file: {}. {}", path.display(), err);
                if let Some(previous) = previous {
                    match self.connect(&previous) {
                        Ok(conn) => {
                            self.conn = Some(conn);
                            self.path = Some(previous);
                        }
                        Err(reopen_err) => {
                            warn!(
                                "Failed to restore previous file: {}. {}",
                                previous.display(),
                                reopen_err
                            );
                        }
                    }
                }
                Err(err)
            }
        }
    }

    /// Open a connection, apply the busy timeout and ensure the schema
    fn connect(&self, path: &Path) -> Result<Connection, StoreError> {
        let open_err = |source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        };

        let conn = Connection::open(path).map_err(open_err)?;
        conn.busy_timeout(Duration::from_millis(self.options.busy_timeout_ms))
            .map_err(open_err)?;

        // SQLite opens lazily; touch the file so a non-database fails here
        conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        })
        .map_err(open_err)?;

        schema::ensure_schema(&conn);
        Ok(conn)
    }

    /// Close the connection and drop every cached result
    pub fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err((_, err)) = conn.close() {
                warn!("error while closing tags database: {}", err);
            }
        }
        self.path = None;
        self.cache.clear();
    }

    /// Close and reopen the current file, re-running schema creation.
    ///
    /// Schema creation is additive only, so no data is lost.
    pub fn reopen(&mut self) -> OpenResult {
        let Some(path) = self.path.clone() else {
            return Err(StoreError::NotOpen);
        };

        debug!("reopening tags database {}", path.display());
        if let Some(conn) = self.conn.take() {
            if let Err((_, err)) = conn.close() {
                warn!("error while closing tags database: {}", err);
            }
        }
        self.cache.clear();

        match self.connect(&path) {
            Ok(conn) => {
                self.conn = Some(conn);
                debug!("tags database reopened successfully");
                Ok(())
            }
            Err(err) => {
                warn!("Failed to reopen file: {}. {}", path.display(), err);
                Err(err)
            }
        }
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Path of the currently open database file
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Bound how long a blocked write waits on a locked database
    pub fn set_busy_timeout(&mut self, ms: u64) -> Result<(), StoreError> {
        self.options.busy_timeout_ms = ms;
        if let Some(conn) = &self.conn {
            conn.busy_timeout(Duration::from_millis(ms))
                .map_err(StoreError::query)?;
        }
        Ok(())
    }

    pub fn search_limit(&self) -> usize {
        self.options.search_limit
    }

    pub fn set_search_limit(&mut self, limit: usize) {
        self.options.search_limit = limit.max(1);
    }

    pub fn set_case_sensitive(&mut self, case_sensitive: bool) {
        self.options.case_sensitive = case_sensitive;
    }

    /// Enable or disable the result cache; disabling drops its contents
    pub fn set_use_cache(&mut self, use_cache: bool) {
        self.options.use_cache = use_cache;
        if !use_cache {
            self.cache.clear();
        }
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Number of query results currently cached
    pub fn cached_queries(&self) -> usize {
        self.cache.len()
    }

    /// Version string this build writes into new stores
    pub fn version(&self) -> &'static str {
        TAGS_DB_VERSION
    }

    /// Version string recorded in the open store
    pub fn schema_version(&self) -> Option<String> {
        let conn = self.conn.as_ref()?;
        schema::read_version(conn).ok().flatten()
    }

    pub(crate) fn conn(&self) -> Result<&Connection, StoreError> {
        self.conn.as_ref().ok_or(StoreError::NotOpen)
    }

    // =========================================================================
    // Transactions (for callers storing with auto_commit = false)
    // =========================================================================

    pub fn begin(&mut self) -> Result<(), StoreError> {
        self.conn()?
            .execute_batch("BEGIN")
            .map_err(StoreError::mutation)
    }

    pub fn commit(&mut self) -> Result<(), StoreError> {
        self.conn()?
            .execute_batch("COMMIT")
            .map_err(StoreError::mutation)
    }

    pub fn rollback(&mut self) -> Result<(), StoreError> {
        let result = self
            .conn()?
            .execute_batch("ROLLBACK")
            .map_err(StoreError::mutation);
        // Rolled-back writes may already have been observed by queries
        self.cache.clear();
        result
    }

    // =========================================================================
    // Fetch
    // =========================================================================

    /// Run a tags query and append the rows to `out`, serving from the
    /// result cache when possible. Failures are logged and yield no rows.
    fn fetch_into(&mut self, query: &SqlQuery, out: &mut Vec<TagEntry>) {
        self.fetch_filtered_into(query, &[], out);
    }

    fn fetch(&mut self, query: &SqlQuery) -> Vec<TagEntry> {
        let mut tags = Vec::new();
        self.fetch_into(query, &mut tags);
        tags
    }

    /// Like [`fetch_into`](Self::fetch_into), keeping only rows whose kind
    /// is in `kinds` (when not empty). The kinds are part of the cache key.
    fn fetch_filtered_into(
        &mut self,
        query: &SqlQuery,
        kinds: &[String],
        out: &mut Vec<TagEntry>,
    ) {
        let key = ResultCache::key(&query.cache_key(), kinds);
        if self.options.use_cache && self.cache.lookup(&key, out) {
            return;
        }

        trace!("Fetching from disk: {}", query.sql());
        let rows = match self.run_query(query) {
            Ok(rows) => rows,
            Err(err) => {
                self.handle_query_error(query.sql(), err);
                return;
            }
        };

        let rows: Vec<TagEntry> = if kinds.is_empty() {
            rows
        } else {
            let accepted: HashSet<&str> = kinds.iter().map(String::as_str).collect();
            rows.into_iter()
                .filter(|tag| accepted.contains(tag.kind.as_str()))
                .collect()
        };
        trace!("Fetching from disk...done, {} matches found", rows.len());

        if self.options.use_cache {
            self.cache.store(&key, &rows);
        }
        out.extend(rows);
    }

    fn run_query(&self, query: &SqlQuery) -> Result<Vec<TagEntry>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(query.sql()).map_err(StoreError::query)?;
        let rows = stmt
            .query_map(params_from_iter(query.params()), tag_from_row)
            .map_err(StoreError::query)?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::query)
    }

    /// Log a failed query and self-heal on an I/O or corruption signature.
    /// The failed query is not retried.
    fn handle_query_error(&mut self, sql: &str, err: StoreError) {
        warn!("Query error: {}. {}", sql, err);
        if err.is_corruption() {
            let _ = self.reopen();
        }
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    /// Row counts and database size
    pub fn statistics(&self) -> Result<StoreStatistics, StoreError> {
        let conn = self.conn()?;
        let count = |table: &str| -> Result<usize, StoreError> {
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get::<_, i64>(0)
            })
            .map(|n| n as usize)
            .map_err(StoreError::query)
        };

        let db_size_bytes = self
            .path
            .as_ref()
            .and_then(|p| fs::metadata(p).ok())
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(StoreStatistics {
            version: schema::read_version(conn)?,
            tags: count("tags")?,
            global_tags: count("global_tags")?,
            files: count("files")?,
            macros: count("macros")?,
            simple_macros: count("simple_macros")?,
            db_size_bytes,
        })
    }
}
