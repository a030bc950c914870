//! Store type definitions
//!
//! Options, ordering vocabulary and operation result types.

use clap::ValueEnum;
use serde::Serialize;

// =========================================================================
// Options
// =========================================================================

/// Tunables of a store session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// How long a write waits on a locked database before failing
    pub busy_timeout_ms: u64,
    /// Result-size ceiling applied to every multi-row query
    pub search_limit: usize,
    /// Match names with a binary range instead of a case-insensitive LIKE
    pub case_sensitive: bool,
    pub use_cache: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 10,
            search_limit: 250,
            case_sensitive: false,
            use_cache: true,
        }
    }
}

// =========================================================================
// Ordering
// =========================================================================

/// Columns a caller may order results by
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OrderColumn {
    Id,
    Name,
    File,
    Line,
    Kind,
    Scope,
    Path,
}

impl OrderColumn {
    pub fn as_sql(&self) -> &'static str {
        match self {
            OrderColumn::Id => "id",
            OrderColumn::Name => "name",
            OrderColumn::File => "file",
            OrderColumn::Line => "line",
            OrderColumn::Kind => "kind",
            OrderColumn::Scope => "scope",
            OrderColumn::Path => "path",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
    /// Order by the column using the engine default direction
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordering {
    pub column: OrderColumn,
    pub direction: OrderDirection,
}

impl Ordering {
    pub fn asc(column: OrderColumn) -> Self {
        Self {
            column,
            direction: OrderDirection::Asc,
        }
    }

    pub fn desc(column: OrderColumn) -> Self {
        Self {
            column,
            direction: OrderDirection::Desc,
        }
    }
}

// =========================================================================
// Operation Result Types
// =========================================================================

/// Statistics from a `store` call
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub files_replaced: usize,
    pub tags_removed: usize,
    pub tags_inserted: usize,
    /// Local variables and malformed candidates
    pub tags_skipped: usize,
}

/// Row counts and on-disk size of the store
#[derive(Debug, Default, Clone, Serialize)]
pub struct StoreStatistics {
    pub version: Option<String>,
    pub tags: usize,
    pub global_tags: usize,
    pub files: usize,
    pub macros: usize,
    pub simple_macros: usize,
    pub db_size_bytes: u64,
}

/// Normalized result of type/scope resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeScope {
    pub name: String,
    pub scope: String,
}
