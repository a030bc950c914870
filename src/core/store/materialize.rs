//! Row materialization
//!
//! Converts persisted rows into value objects. Column order is fixed by the
//! `*_COLUMNS` constants, which every SELECT in the store uses.

use rusqlite::Row;

use crate::core::tag::{FileEntry, PPToken, TagEntry};

/// Column list of the tags table, in materialization order
pub(super) const TAG_COLUMNS: &str = "id, name, file, line, kind, access, signature, pattern, \
     parent, inherits, path, typeref, scope, template_definition, tag_properties, macrodef";

pub(super) const FILE_COLUMNS: &str = "id, file, last_retagged";

pub(super) const MACRO_COLUMNS: &str =
    "id, file, line, name, is_function_like, replacement, signature";

/// Text column that may hold NULL
fn text(row: &Row, idx: usize) -> rusqlite::Result<String> {
    Ok(row.get::<_, Option<String>>(idx)?.unwrap_or_default())
}

fn integer(row: &Row, idx: usize) -> rusqlite::Result<i64> {
    Ok(row.get::<_, Option<i64>>(idx)?.unwrap_or_default())
}

/// Build a tag from a row selected with [`TAG_COLUMNS`]
pub(super) fn tag_from_row(row: &Row) -> rusqlite::Result<TagEntry> {
    Ok(TagEntry {
        id: Some(row.get(0)?),
        name: text(row, 1)?,
        file: text(row, 2)?,
        line: integer(row, 3)?,
        kind: text(row, 4)?,
        access: text(row, 5)?,
        signature: text(row, 6)?,
        pattern: text(row, 7)?,
        parent: text(row, 8)?,
        inherits: TagEntry::parse_inherits(&text(row, 9)?),
        path: text(row, 10)?,
        typeref: text(row, 11)?,
        scope: text(row, 12)?,
        template_definition: text(row, 13)?,
        tag_properties: text(row, 14)?,
        macrodef: text(row, 15)?,
    })
}

/// Build a file entry from a row selected with [`FILE_COLUMNS`]
pub(super) fn file_from_row(row: &Row) -> rusqlite::Result<FileEntry> {
    Ok(FileEntry {
        id: row.get(0)?,
        file: text(row, 1)?,
        last_retagged: integer(row, 2)?,
    })
}

/// Build a preprocessor token from a row selected with [`MACRO_COLUMNS`]
pub(super) fn pp_token_from_row(row: &Row) -> rusqlite::Result<PPToken> {
    Ok(PPToken {
        name: text(row, 3)?,
        is_function_like: integer(row, 4)? != 0,
        line: integer(row, 2)?,
        replacement: text(row, 5)?,
        args: parse_macro_args(&text(row, 6)?),
    })
}

/// `(a, b)` -> `["a", "b"]`
pub(super) fn parse_macro_args(signature: &str) -> Vec<String> {
    signature
        .replace(['(', ')'], "")
        .split(',')
        .map(str::trim)
        .filter(|arg| !arg.is_empty())
        .map(String::from)
        .collect()
}
