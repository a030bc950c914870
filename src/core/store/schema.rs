//! Database schema initialization
//!
//! Every statement is idempotent, so running the whole list against an
//! existing store converges to the same schema. A failing statement is
//! logged and skipped: a store with a missing index is slower, not wrong.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

use super::StoreError;

/// Version string written into `tags_version` on every schema creation
pub const TAGS_DB_VERSION: &str = "tagdb v1.0.0";

/// Pragmas trading durability for speed. The rollback journal stays in
/// memory so batches can still be rolled back. Must run before table creation.
const PRAGMAS: &[&str] = &[
    "PRAGMA journal_mode = MEMORY;",
    "PRAGMA synchronous = OFF;",
    "PRAGMA temp_store = MEMORY;",
    "PRAGMA case_sensitive_like = 0;",
];

const SCHEMA: &[&str] = &[
    // Tags
    r#"CREATE TABLE IF NOT EXISTS tags (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT,
        file TEXT,
        line INTEGER,
        kind TEXT,
        access TEXT,
        signature TEXT,
        pattern TEXT,
        parent TEXT,
        inherits TEXT,
        path TEXT,
        typeref TEXT,
        scope TEXT,
        template_definition TEXT,
        tag_properties TEXT,
        macrodef TEXT
    );"#,
    // Projection of global-scope tags, maintained by the mutation pipeline
    r#"CREATE TABLE IF NOT EXISTS global_tags (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT,
        tag_id INTEGER
    );"#,
    r#"CREATE TABLE IF NOT EXISTS files (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        file TEXT,
        last_retagged INTEGER
    );"#,
    r#"CREATE TABLE IF NOT EXISTS macros (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        file TEXT,
        line INTEGER,
        name TEXT,
        is_function_like INTEGER,
        replacement TEXT,
        signature TEXT
    );"#,
    r#"CREATE TABLE IF NOT EXISTS simple_macros (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        file TEXT,
        name TEXT
    );"#,
    r#"CREATE TABLE IF NOT EXISTS tags_version (
        version TEXT PRIMARY KEY
    );"#,
    // Uniqueness
    "CREATE UNIQUE INDEX IF NOT EXISTS files_name ON files(file);",
    "CREATE UNIQUE INDEX IF NOT EXISTS tags_uniq ON tags(file, kind, path, signature, typeref, template_definition);",
    "CREATE UNIQUE INDEX IF NOT EXISTS macros_uniq ON macros(name);",
    "CREATE UNIQUE INDEX IF NOT EXISTS tags_version_uniq ON tags_version(version);",
    // Search indexes
    "CREATE INDEX IF NOT EXISTS tags_kind ON tags(kind);",
    "CREATE INDEX IF NOT EXISTS tags_file ON tags(file);",
    "CREATE INDEX IF NOT EXISTS tags_name ON tags(name);",
    "CREATE INDEX IF NOT EXISTS tags_scope ON tags(scope);",
    "CREATE INDEX IF NOT EXISTS tags_path ON tags(path);",
    "CREATE INDEX IF NOT EXISTS tags_parent ON tags(parent);",
    "CREATE INDEX IF NOT EXISTS tags_typeref ON tags(typeref);",
    "CREATE INDEX IF NOT EXISTS global_tags_name ON global_tags(name);",
    "CREATE INDEX IF NOT EXISTS global_tags_tag_id ON global_tags(tag_id);",
    "CREATE INDEX IF NOT EXISTS simple_macros_file ON simple_macros(file);",
];

/// Create or upgrade the schema on an open connection.
///
/// Returns the number of statements that failed; zero means the schema is
/// complete.
pub(super) fn ensure_schema(conn: &Connection) -> usize {
    let mut failures = 0;

    for statement in PRAGMAS.iter().chain(SCHEMA) {
        if let Err(source) = conn.execute_batch(statement) {
            let err = StoreError::Schema {
                statement: statement.split_whitespace().collect::<Vec<_>>().join(" "),
                source,
            };
            warn!("{}", err);
            failures += 1;
        }
    }

    // Single row: older vintages are dropped, the current one replaced
    let recorded = conn
        .execute(
            "DELETE FROM tags_version WHERE version <> ?1",
            params![TAGS_DB_VERSION],
        )
        .and_then(|_| {
            conn.execute(
                "REPLACE INTO tags_version (version) VALUES (?1)",
                params![TAGS_DB_VERSION],
            )
        });
    if let Err(source) = recorded {
        warn!("failed to record schema version: {}", source);
        failures += 1;
    }

    debug!(failures, "schema ensured");
    failures
}

/// Read the version string recorded in the store, if any
pub(super) fn read_version(conn: &Connection) -> Result<Option<String>, StoreError> {
    conn.query_row("SELECT version FROM tags_version LIMIT 1", [], |row| {
        row.get(0)
    })
    .optional()
    .map_err(StoreError::query)
}
