//! Tags storage backend abstraction
//!
//! Consumers (indexers, completion engines, the CLI) talk to a store through
//! [`TagsStorage`] so that an alternative backend can be substituted without
//! touching them. [`SqliteTagsStore`] is the only backend shipped.

use std::path::Path;

use crate::core::store::{
    MutationResult, OpenResult, Ordering, SqliteTagsStore, StoreError, StoreStatistics,
    StoreStats, TypeScope,
};
use crate::core::tag::{FileEntry, MacroEntry, PPToken, TagEntry};

/// A persistent, queryable symbol tags store
pub trait TagsStorage {
    // Session
    fn open(&mut self, path: &Path) -> OpenResult;
    fn close(&mut self);
    fn reopen(&mut self) -> OpenResult;
    fn is_open(&self) -> bool;
    fn path(&self) -> Option<&Path>;
    fn set_busy_timeout(&mut self, ms: u64) -> Result<(), StoreError>;
    fn set_use_cache(&mut self, use_cache: bool);
    fn search_limit(&self) -> usize;
    fn set_search_limit(&mut self, limit: usize);
    fn version(&self) -> &'static str;
    fn schema_version(&self) -> Option<String>;
    fn statistics(&self) -> Result<StoreStatistics, StoreError>;

    // Transactions
    fn begin(&mut self) -> Result<(), StoreError>;
    fn commit(&mut self) -> Result<(), StoreError>;
    fn rollback(&mut self) -> Result<(), StoreError>;

    // Mutation
    fn store(&mut self, tags: &[TagEntry], auto_commit: bool) -> MutationResult<StoreStats>;
    fn delete_by_file(&mut self, file: &str, auto_commit: bool) -> MutationResult<usize>;
    fn clear(&mut self) -> MutationResult<()>;
    fn insert_file_entry(&mut self, file: &str, timestamp: i64) -> MutationResult<()>;
    fn update_file_entry(&mut self, file: &str, timestamp: i64) -> MutationResult<()>;
    fn delete_file_entry(&mut self, file: &str) -> MutationResult<()>;
    fn store_macros(&mut self, macros: &[MacroEntry]) -> MutationResult<usize>;
    fn store_simple_macros(&mut self, file: &str, names: &[String]) -> MutationResult<usize>;

    // Retrieval
    fn tags_by_file(&mut self, file: &str) -> Vec<TagEntry>;
    fn tags_by_file_and_line(&mut self, file: &str, line: i64) -> Vec<TagEntry>;
    fn tags_by_kind_and_file(
        &mut self,
        kinds: &[String],
        file: &str,
        ordering: Option<Ordering>,
    ) -> Vec<TagEntry>;
    fn scope_at(&mut self, file: &str, line: i64) -> Option<TagEntry>;
    fn file_scoped_tags(&mut self, file: &str, name: &str, kinds: &[String]) -> Vec<TagEntry>;
    fn tags_by_scope(&mut self, scope: &str) -> Vec<TagEntry>;
    fn tags_by_scope_and_name(&mut self, scope: &str, name: &str, partial: bool) -> Vec<TagEntry>;
    fn tags_by_scopes_and_name(&mut self, scopes: &[String], name: &str, partial: bool)
        -> Vec<TagEntry>;
    fn tags_by_scopes_and_kind(&mut self, scopes: &[String], kinds: &[String]) -> Vec<TagEntry>;
    fn tags_by_scope_and_kind(&mut self, scope: &str, kinds: &[String], filter: &str)
        -> Vec<TagEntry>;
    fn tags_by_kind(&mut self, kinds: &[String], ordering: Option<Ordering>) -> Vec<TagEntry>;
    fn tags_by_path(&mut self, paths: &[String]) -> Vec<TagEntry>;
    fn tags_by_path_limit(&mut self, path: &str, limit: usize) -> Vec<TagEntry>;
    fn tags_by_path_and_kind(&mut self, path: &str, kinds: &[String], limit: usize)
        -> Vec<TagEntry>;
    fn tags_by_kind_and_path(&mut self, kinds: &[String], path: &str) -> Vec<TagEntry>;
    fn tags_by_path_parts(&mut self, parts: &[String]) -> Vec<TagEntry>;
    fn tags_by_name(&mut self, prefix: &str, exact: bool) -> Vec<TagEntry>;
    fn tag_by_name_limit_one(&mut self, name: &str) -> Option<TagEntry>;
    fn tags_by_part_name(&mut self, part: &str) -> Vec<TagEntry>;
    fn tags_by_name_and_parent(&mut self, name: &str, parent: &str) -> Vec<TagEntry>;
    fn parameters(&mut self, function_path: &str) -> Vec<TagEntry>;
    fn lambdas(&mut self, parent_function: &str) -> Vec<TagEntry>;
    fn dereference_operator(&mut self, scope: &str) -> Option<TagEntry>;
    fn subscript_operator(&mut self, scope: &str) -> Option<TagEntry>;
    fn resolve_type_scope(&mut self, type_name: &str, scope: &str) -> Option<TypeScope>;
    fn type_and_scope_exists(&mut self, type_name: &str, scope: &str) -> bool;

    // Files and macros
    fn files(&mut self) -> Vec<FileEntry>;
    fn files_matching(&mut self, partial: &str) -> Vec<FileEntry>;
    fn files_for_completion(&mut self, typed: &str) -> Vec<String>;
    fn get_macro(&mut self, name: &str) -> Option<PPToken>;
    fn simple_macros_for_file(&mut self, file: &str) -> Vec<String>;
}

impl TagsStorage for SqliteTagsStore {
    fn open(&mut self, path: &Path) -> OpenResult {
        SqliteTagsStore::open(self, path)
    }

    fn close(&mut self) {
        SqliteTagsStore::close(self)
    }

    fn reopen(&mut self) -> OpenResult {
        SqliteTagsStore::reopen(self)
    }

    fn is_open(&self) -> bool {
        SqliteTagsStore::is_open(self)
    }

    fn path(&self) -> Option<&Path> {
        SqliteTagsStore::path(self)
    }

    fn set_busy_timeout(&mut self, ms: u64) -> Result<(), StoreError> {
        SqliteTagsStore::set_busy_timeout(self, ms)
    }

    fn set_use_cache(&mut self, use_cache: bool) {
        SqliteTagsStore::set_use_cache(self, use_cache)
    }

    fn search_limit(&self) -> usize {
        SqliteTagsStore::search_limit(self)
    }

    fn set_search_limit(&mut self, limit: usize) {
        SqliteTagsStore::set_search_limit(self, limit)
    }

    fn version(&self) -> &'static str {
        SqliteTagsStore::version(self)
    }

    fn schema_version(&self) -> Option<String> {
        SqliteTagsStore::schema_version(self)
    }

    fn statistics(&self) -> Result<StoreStatistics, StoreError> {
        SqliteTagsStore::statistics(self)
    }

    fn begin(&mut self) -> Result<(), StoreError> {
        SqliteTagsStore::begin(self)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        SqliteTagsStore::commit(self)
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        SqliteTagsStore::rollback(self)
    }

    fn store(&mut self, tags: &[TagEntry], auto_commit: bool) -> MutationResult<StoreStats> {
        SqliteTagsStore::store(self, tags, auto_commit)
    }

    fn delete_by_file(&mut self, file: &str, auto_commit: bool) -> MutationResult<usize> {
        SqliteTagsStore::delete_by_file(self, file, auto_commit)
    }

    fn clear(&mut self) -> MutationResult<()> {
        SqliteTagsStore::clear(self)
    }

    fn insert_file_entry(&mut self, file: &str, timestamp: i64) -> MutationResult<()> {
        SqliteTagsStore::insert_file_entry(self, file, timestamp)
    }

    fn update_file_entry(&mut self, file: &str, timestamp: i64) -> MutationResult<()> {
        SqliteTagsStore::update_file_entry(self, file, timestamp)
    }

    fn delete_file_entry(&mut self, file: &str) -> MutationResult<()> {
        SqliteTagsStore::delete_file_entry(self, file)
    }

    fn store_macros(&mut self, macros: &[MacroEntry]) -> MutationResult<usize> {
        SqliteTagsStore::store_macros(self, macros)
    }

    fn store_simple_macros(&mut self, file: &str, names: &[String]) -> MutationResult<usize> {
        SqliteTagsStore::store_simple_macros(self, file, names)
    }

    fn tags_by_file(&mut self, file: &str) -> Vec<TagEntry> {
        SqliteTagsStore::tags_by_file(self, file)
    }

    fn tags_by_file_and_line(&mut self, file: &str, line: i64) -> Vec<TagEntry> {
        SqliteTagsStore::tags_by_file_and_line(self, file, line)
    }

    fn tags_by_kind_and_file(
        &mut self,
        kinds: &[String],
        file: &str,
        ordering: Option<Ordering>,
    ) -> Vec<TagEntry> {
        SqliteTagsStore::tags_by_kind_and_file(self, kinds, file, ordering)
    }

    fn scope_at(&mut self, file: &str, line: i64) -> Option<TagEntry> {
        SqliteTagsStore::scope_at(self, file, line)
    }

    fn file_scoped_tags(&mut self, file: &str, name: &str, kinds: &[String]) -> Vec<TagEntry> {
        SqliteTagsStore::file_scoped_tags(self, file, name, kinds)
    }

    fn tags_by_scope(&mut self, scope: &str) -> Vec<TagEntry> {
        SqliteTagsStore::tags_by_scope(self, scope)
    }

    fn tags_by_scope_and_name(&mut self, scope: &str, name: &str, partial: bool) -> Vec<TagEntry> {
        SqliteTagsStore::tags_by_scope_and_name(self, scope, name, partial)
    }

    fn tags_by_scopes_and_name(
        &mut self,
        scopes: &[String],
        name: &str,
        partial: bool,
    ) -> Vec<TagEntry> {
        SqliteTagsStore::tags_by_scopes_and_name(self, scopes, name, partial)
    }

    fn tags_by_scopes_and_kind(&mut self, scopes: &[String], kinds: &[String]) -> Vec<TagEntry> {
        SqliteTagsStore::tags_by_scopes_and_kind(self, scopes, kinds)
    }

    fn tags_by_scope_and_kind(
        &mut self,
        scope: &str,
        kinds: &[String],
        filter: &str,
    ) -> Vec<TagEntry> {
        SqliteTagsStore::tags_by_scope_and_kind(self, scope, kinds, filter)
    }

    fn tags_by_kind(&mut self, kinds: &[String], ordering: Option<Ordering>) -> Vec<TagEntry> {
        SqliteTagsStore::tags_by_kind(self, kinds, ordering)
    }

    fn tags_by_path(&mut self, paths: &[String]) -> Vec<TagEntry> {
        SqliteTagsStore::tags_by_path(self, paths)
    }

    fn tags_by_path_limit(&mut self, path: &str, limit: usize) -> Vec<TagEntry> {
        SqliteTagsStore::tags_by_path_limit(self, path, limit)
    }

    fn tags_by_path_and_kind(
        &mut self,
        path: &str,
        kinds: &[String],
        limit: usize,
    ) -> Vec<TagEntry> {
        SqliteTagsStore::tags_by_path_and_kind(self, path, kinds, limit)
    }

    fn tags_by_kind_and_path(&mut self, kinds: &[String], path: &str) -> Vec<TagEntry> {
        SqliteTagsStore::tags_by_kind_and_path(self, kinds, path)
    }

    fn tags_by_path_parts(&mut self, parts: &[String]) -> Vec<TagEntry> {
        SqliteTagsStore::tags_by_path_parts(self, parts)
    }

    fn tags_by_name(&mut self, prefix: &str, exact: bool) -> Vec<TagEntry> {
        SqliteTagsStore::tags_by_name(self, prefix, exact)
    }

    fn tag_by_name_limit_one(&mut self, name: &str) -> Option<TagEntry> {
        SqliteTagsStore::tag_by_name_limit_one(self, name)
    }

    fn tags_by_part_name(&mut self, part: &str) -> Vec<TagEntry> {
        SqliteTagsStore::tags_by_part_name(self, part)
    }

    fn tags_by_name_and_parent(&mut self, name: &str, parent: &str) -> Vec<TagEntry> {
        SqliteTagsStore::tags_by_name_and_parent(self, name, parent)
    }

    fn parameters(&mut self, function_path: &str) -> Vec<TagEntry> {
        SqliteTagsStore::parameters(self, function_path)
    }

    fn lambdas(&mut self, parent_function: &str) -> Vec<TagEntry> {
        SqliteTagsStore::lambdas(self, parent_function)
    }

    fn dereference_operator(&mut self, scope: &str) -> Option<TagEntry> {
        SqliteTagsStore::dereference_operator(self, scope)
    }

    fn subscript_operator(&mut self, scope: &str) -> Option<TagEntry> {
        SqliteTagsStore::subscript_operator(self, scope)
    }

    fn resolve_type_scope(&mut self, type_name: &str, scope: &str) -> Option<TypeScope> {
        SqliteTagsStore::resolve_type_scope(self, type_name, scope)
    }

    fn type_and_scope_exists(&mut self, type_name: &str, scope: &str) -> bool {
        SqliteTagsStore::type_and_scope_exists(self, type_name, scope)
    }

    fn files(&mut self) -> Vec<FileEntry> {
        SqliteTagsStore::files(self)
    }

    fn files_matching(&mut self, partial: &str) -> Vec<FileEntry> {
        SqliteTagsStore::files_matching(self, partial)
    }

    fn files_for_completion(&mut self, typed: &str) -> Vec<String> {
        SqliteTagsStore::files_for_completion(self, typed)
    }

    fn get_macro(&mut self, name: &str) -> Option<PPToken> {
        SqliteTagsStore::get_macro(self, name)
    }

    fn simple_macros_for_file(&mut self, file: &str) -> Vec<String> {
        SqliteTagsStore::simple_macros_for_file(self, file)
    }
}
