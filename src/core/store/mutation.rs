//! Mutation pipeline
//!
//! Tags are replaced per source file: every row a file owns is deleted
//! right before the file's new batch is inserted. The global-scope
//! projection (`global_tags`) is maintained here, inside the same
//! transaction as the `tags` rows it mirrors.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

use super::{MutationResult, SqliteTagsStore, StoreError, StoreStats};
use crate::core::tag::{MacroEntry, TagEntry, GLOBAL_SCOPE};

/// The unique key of a tag row
type TagKey = (String, String, String, String, String, String);

fn tag_key(tag: &TagEntry) -> TagKey {
    (
        tag.file.clone(),
        tag.kind.clone(),
        tag.path.clone(),
        tag.signature.clone(),
        tag.typeref.clone(),
        tag.template_definition.clone(),
    )
}

const SQL_FIND_BY_KEY: &str = "SELECT id FROM tags WHERE file = ?1 AND kind = ?2 AND path = ?3 \
     AND signature = ?4 AND typeref = ?5 AND template_definition = ?6";

const SQL_INSERT_TAG: &str = "INSERT INTO tags
     (id, name, file, line, kind, access, signature, pattern, parent, inherits,
      path, typeref, scope, template_definition, tag_properties, macrodef)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)";

const SQL_UPDATE_TAG: &str = "UPDATE tags SET
     name = ?2, file = ?3, line = ?4, kind = ?5, access = ?6, signature = ?7, pattern = ?8,
     parent = ?9, inherits = ?10, path = ?11, typeref = ?12, scope = ?13,
     template_definition = ?14, tag_properties = ?15, macrodef = ?16
     WHERE id = ?1";

impl SqliteTagsStore {
    /// Replace the tags of every file referenced by `tags`.
    ///
    /// With `auto_commit` the call runs in its own transaction and is atomic
    /// with respect to the files it touches. Without it, the caller owns the
    /// enclosing transaction (see [`begin`](Self::begin)). Local variables
    /// and malformed candidates are skipped. The result cache is cleared
    /// whenever the batch is not empty.
    pub fn store(&mut self, tags: &[TagEntry], auto_commit: bool) -> MutationResult<StoreStats> {
        if tags.is_empty() {
            return Ok(StoreStats::default());
        }

        let result = match self.conn.as_ref() {
            Some(conn) => write_batch(conn, tags, auto_commit),
            None => Err(StoreError::NotOpen),
        };
        self.cache.clear();

        match &result {
            Ok(stats) => debug!(
                files = stats.files_replaced,
                inserted = stats.tags_inserted,
                skipped = stats.tags_skipped,
                "stored tags batch"
            ),
            Err(err) => {
                warn!("TagsStorage store error: {}", err);
                if err.is_corruption() {
                    let _ = self.reopen();
                }
            }
        }
        result
    }

    /// Delete every tag owned by `file`, its global projections and its
    /// file entry.
    pub fn delete_by_file(&mut self, file: &str, auto_commit: bool) -> MutationResult<usize> {
        let result = match self.conn.as_ref() {
            Some(conn) => in_transaction(conn, auto_commit, |conn| delete_file(conn, file)),
            None => Err(StoreError::NotOpen),
        };
        self.cache.clear();

        if let Err(err) = &result {
            warn!("failed to delete tags of {}: {}", file, err);
        }
        result
    }

    /// Remove all tags, files and macros. The version row is kept.
    pub fn clear(&mut self) -> MutationResult<()> {
        let result = self.conn().and_then(|conn| {
            conn.execute_batch(
                r#"
            DELETE FROM global_tags;
            DELETE FROM tags;
            DELETE FROM files;
            DELETE FROM macros;
            DELETE FROM simple_macros;
            "#,
            )
            .map_err(StoreError::mutation)
        });
        self.cache.clear();
        result
    }

    // =========================================================================
    // File entries
    // =========================================================================

    pub fn insert_file_entry(&mut self, file: &str, timestamp: i64) -> MutationResult<()> {
        insert_file_entry(self.conn()?, file, timestamp)
    }

    pub fn update_file_entry(&mut self, file: &str, timestamp: i64) -> MutationResult<()> {
        self.conn()?
            .execute(
                "UPDATE OR REPLACE files SET last_retagged = ?1 WHERE file = ?2",
                params![timestamp, file],
            )
            .map(|_| ())
            .map_err(StoreError::mutation)
    }

    pub fn delete_file_entry(&mut self, file: &str) -> MutationResult<()> {
        self.conn()?
            .execute("DELETE FROM files WHERE file = ?1", params![file])
            .map(|_| ())
            .map_err(StoreError::mutation)
    }

    // =========================================================================
    // Macros
    // =========================================================================

    /// Insert macros, replacing any existing macro with the same name
    pub fn store_macros(&mut self, macros: &[MacroEntry]) -> MutationResult<usize> {
        let conn = self.conn()?;
        in_transaction(conn, true, |conn| {
            let mut stmt = conn
                .prepare_cached(
                    "INSERT OR REPLACE INTO macros
                     (file, line, name, is_function_like, replacement, signature)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                )
                .map_err(StoreError::mutation)?;
            for m in macros {
                stmt.execute(params![
                    m.file,
                    m.line,
                    m.name,
                    m.is_function_like as i64,
                    m.replacement,
                    m.signature
                ])
                .map_err(StoreError::mutation)?;
            }
            Ok(macros.len())
        })
    }

    /// Replace the simple macros defined by `file`
    pub fn store_simple_macros(&mut self, file: &str, names: &[String]) -> MutationResult<usize> {
        let conn = self.conn()?;
        in_transaction(conn, true, |conn| {
            conn.execute("DELETE FROM simple_macros WHERE file = ?1", params![file])
                .map_err(StoreError::mutation)?;
            let mut stmt = conn
                .prepare_cached("INSERT INTO simple_macros (file, name) VALUES (?1, ?2)")
                .map_err(StoreError::mutation)?;
            for name in names {
                stmt.execute(params![file, name])
                    .map_err(StoreError::mutation)?;
            }
            Ok(names.len())
        })
    }
}

/// Run `f` inside a transaction when `auto_commit` is set. Dropping the
/// transaction on an early return rolls it back.
fn in_transaction<T>(
    conn: &Connection,
    auto_commit: bool,
    f: impl FnOnce(&Connection) -> MutationResult<T>,
) -> MutationResult<T> {
    if !auto_commit {
        return f(conn);
    }

    let tx = conn
        .unchecked_transaction()
        .map_err(StoreError::mutation)?;
    let value = f(conn)?;
    tx.commit().map_err(StoreError::mutation)?;
    Ok(value)
}

fn write_batch(conn: &Connection, tags: &[TagEntry], auto_commit: bool) -> MutationResult<StoreStats> {
    in_transaction(conn, auto_commit, |conn| {
        let mut stats = StoreStats::default();

        let files: BTreeSet<&str> = tags
            .iter()
            .map(|tag| tag.file.as_str())
            .filter(|file| !file.is_empty())
            .collect();

        // Remember the ids of replaced rows so an unchanged tag keeps its id
        let mut previous_ids: HashMap<TagKey, i64> = HashMap::new();
        for file in &files {
            previous_ids.extend(existing_ids(conn, file)?);
            stats.tags_removed += delete_file(conn, file)?;
        }

        for tag in tags {
            if tag.is_local_variable() || !tag.is_ok() {
                stats.tags_skipped += 1;
                continue;
            }
            let reuse = previous_ids.remove(&tag_key(tag));
            upsert_tag(conn, tag, reuse)?;
            stats.tags_inserted += 1;
        }

        let now = Utc::now().timestamp();
        for file in &files {
            insert_file_entry(conn, file, now)?;
        }
        stats.files_replaced = files.len();

        Ok(stats)
    })
}

fn existing_ids(conn: &Connection, file: &str) -> MutationResult<Vec<(TagKey, i64)>> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT id, file, kind, path, signature, typeref, template_definition
             FROM tags WHERE file = ?1",
        )
        .map_err(StoreError::mutation)?;
    let rows = stmt
        .query_map(params![file], |row| {
            let text = |idx: usize| -> rusqlite::Result<String> {
                Ok(row.get::<_, Option<String>>(idx)?.unwrap_or_default())
            };
            Ok((
                (text(1)?, text(2)?, text(3)?, text(4)?, text(5)?, text(6)?),
                row.get::<_, i64>(0)?,
            ))
        })
        .map_err(StoreError::mutation)?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(StoreError::mutation)
}

/// Delete a file's tags, their global projections and the file entry.
/// Returns the number of tags removed.
fn delete_file(conn: &Connection, file: &str) -> MutationResult<usize> {
    conn.execute(
        "DELETE FROM global_tags WHERE tag_id IN (SELECT id FROM tags WHERE file = ?1)",
        params![file],
    )
    .map_err(StoreError::mutation)?;
    let removed = conn
        .execute("DELETE FROM tags WHERE file = ?1", params![file])
        .map_err(StoreError::mutation)?;
    conn.execute("DELETE FROM files WHERE file = ?1", params![file])
        .map_err(StoreError::mutation)?;
    Ok(removed)
}

/// Insert a tag, or update in place the row holding the same unique key.
/// Keeps the global projection in step with the row's scope.
fn upsert_tag(conn: &Connection, tag: &TagEntry, reuse_id: Option<i64>) -> MutationResult<i64> {
    let existing: Option<i64> = conn
        .prepare_cached(SQL_FIND_BY_KEY)
        .and_then(|mut stmt| {
            stmt.query_row(
                params![
                    tag.file,
                    tag.kind,
                    tag.path,
                    tag.signature,
                    tag.typeref,
                    tag.template_definition
                ],
                |row| row.get(0),
            )
            .optional()
        })
        .map_err(StoreError::mutation)?;

    let inherits = tag.inherits_as_string();
    let (sql, id) = match existing {
        Some(id) => (SQL_UPDATE_TAG, Some(id)),
        None => (SQL_INSERT_TAG, reuse_id),
    };
    conn.prepare_cached(sql)
        .and_then(|mut stmt| {
            stmt.execute(params![
                id,
                tag.name,
                tag.file,
                tag.line,
                tag.kind,
                tag.access,
                tag.signature,
                tag.pattern,
                tag.parent,
                inherits,
                tag.path,
                tag.typeref,
                tag.scope,
                tag.template_definition,
                tag.tag_properties,
                tag.macrodef
            ])
        })
        .map_err(StoreError::mutation)?;

    let id = match existing {
        Some(id) => {
            conn.execute("DELETE FROM global_tags WHERE tag_id = ?1", params![id])
                .map_err(StoreError::mutation)?;
            id
        }
        None => conn.last_insert_rowid(),
    };

    if tag.scope == GLOBAL_SCOPE {
        conn.execute(
            "INSERT INTO global_tags (name, tag_id) VALUES (?1, ?2)",
            params![tag.name, id],
        )
        .map_err(StoreError::mutation)?;
    }
    Ok(id)
}

fn insert_file_entry(conn: &Connection, file: &str, timestamp: i64) -> MutationResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO files (file, last_retagged) VALUES (?1, ?2)",
        params![file, timestamp],
    )
    .map(|_| ())
    .map_err(StoreError::mutation)
}
