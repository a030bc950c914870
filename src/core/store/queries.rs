//! Retrieval operations
//!
//! A closed family of lookups sharing one filter vocabulary. Every query
//! that can return more than one row is bounded by the session's search
//! limit. Failures yield empty results; see `SqliteTagsStore::fetch_into`.

use std::collections::HashSet;

use rusqlite::{params, params_from_iter, OptionalExtension};

use super::builder::{escape_like, SqlQuery};
use super::materialize::{file_from_row, pp_token_from_row, FILE_COLUMNS, MACRO_COLUMNS};
use super::{OrderColumn, Ordering, SqliteTagsStore, StoreError, TypeScope};
use crate::core::tag::{kind, FileEntry, PPToken, TagEntry, ANONYMOUS_SCOPE_PREFIX, GLOBAL_SCOPE};

/// Kinds considered when resolving a type name
const TYPE_KINDS: [&str; 3] = [kind::CLASS, kind::STRUCT, kind::TYPEDEF];

/// Candidates sampled by `resolve_type_scope`
const TYPE_SAMPLE_LIMIT: usize = 50;

impl SqliteTagsStore {
    // =========================================================================
    // By file
    // =========================================================================

    /// All tags of `file`, ordered by line
    pub fn tags_by_file(&mut self, file: &str) -> Vec<TagEntry> {
        let mut q = SqlQuery::select_tags();
        q.eq("file", file.to_string())
            .order_by(Some(Ordering::asc(OrderColumn::Line)))
            .limit(self.search_limit());
        self.fetch(&q)
    }

    pub fn tags_by_file_and_line(&mut self, file: &str, line: i64) -> Vec<TagEntry> {
        let mut q = SqlQuery::select_tags();
        q.eq("file", file.to_string())
            .push(" AND ")
            .eq("line", line)
            .limit(self.search_limit());
        self.fetch(&q)
    }

    pub fn tags_by_kind_and_file(
        &mut self,
        kinds: &[String],
        file: &str,
        ordering: Option<Ordering>,
    ) -> Vec<TagEntry> {
        if kinds.is_empty() {
            return vec![];
        }
        let mut q = SqlQuery::select_tags();
        q.eq("file", file.to_string())
            .push(" AND ")
            .is_in("kind", kinds)
            .order_by(ordering)
            .limit(self.search_limit());
        self.fetch(&q)
    }

    /// The innermost named function, class, struct or namespace starting at
    /// or before `line` in `file`
    pub fn scope_at(&mut self, file: &str, line: i64) -> Option<TagEntry> {
        if file.is_empty() || line < 0 {
            return None;
        }
        let mut q = SqlQuery::select_tags();
        q.eq("file", file.to_string())
            .push(" AND line <= ")
            .bind(line)
            .push(" AND name NOT LIKE ")
            .bind(format!("{}%", escape_like(ANONYMOUS_SCOPE_PREFIX)))
            .push(" ESCAPE '^' AND ")
            .is_in(
                "kind",
                &[kind::FUNCTION, kind::CLASS, kind::STRUCT, kind::NAMESPACE],
            )
            .order_by(Some(Ordering::desc(OrderColumn::Line)))
            .limit(1);
        self.fetch(&q).into_iter().next()
    }

    /// Tags visible at file level: the anonymous-scope tags of `file`
    /// (restricted to `kinds`) followed by its members, variables, classes,
    /// structs and enums. De-duplicated and sorted by line.
    pub fn file_scoped_tags(&mut self, file: &str, name: &str, kinds: &[String]) -> Vec<TagEntry> {
        if file.is_empty() {
            return vec![];
        }

        let name_filter = |q: &mut SqlQuery| {
            if !name.is_empty() {
                q.push(" AND ").like("name", format!("{}%", escape_like(name)));
            }
        };

        let mut anonymous = SqlQuery::select_tags();
        anonymous
            .eq("file", file.to_string())
            .push(" AND ")
            .like("scope", format!("{}%", escape_like(ANONYMOUS_SCOPE_PREFIX)));
        name_filter(&mut anonymous);
        anonymous.limit(self.search_limit());

        let mut members = SqlQuery::select_tags();
        members.eq("file", file.to_string()).push(" AND ").is_in(
            "kind",
            &[
                kind::MEMBER,
                kind::VARIABLE,
                kind::CLASS,
                kind::STRUCT,
                kind::ENUM,
            ],
        );
        name_filter(&mut members);
        members.limit(self.search_limit());

        let mut candidates = Vec::new();
        self.fetch_filtered_into(&anonymous, kinds, &mut candidates);
        self.fetch_into(&members, &mut candidates);

        let mut visited = HashSet::new();
        let mut tags: Vec<TagEntry> = candidates
            .into_iter()
            .filter(|tag| visited.insert(tag.id))
            .collect();
        tags.sort_by_key(|tag| tag.line);
        tags
    }

    // =========================================================================
    // By scope
    // =========================================================================

    pub fn tags_by_scope(&mut self, scope: &str) -> Vec<TagEntry> {
        let mut q = SqlQuery::select_tags();
        q.eq("scope", scope.to_string())
            .order_by(Some(Ordering::asc(OrderColumn::Name)))
            .limit(self.search_limit());
        self.fetch(&q)
    }

    /// Tags named `name` (or starting with it when `partial`) in `scope`.
    ///
    /// The global scope is resolved through the `global_tags` projection
    /// rather than by scanning the scope column.
    pub fn tags_by_scope_and_name(&mut self, scope: &str, name: &str, partial: bool) -> Vec<TagEntry> {
        if name.is_empty() {
            return vec![];
        }
        let case_sensitive = self.options.case_sensitive;

        let mut q = SqlQuery::select_tags();
        if scope.is_empty() || scope == GLOBAL_SCOPE {
            q.push("id IN (SELECT tag_id FROM global_tags WHERE ")
                .name_part(name, partial, false, case_sensitive)
                .push(")");
        } else {
            q.eq("scope", scope.to_string())
                .name_part(name, partial, true, case_sensitive);
        }
        q.limit(self.search_limit());
        self.fetch(&q)
    }

    /// Like [`tags_by_scope_and_name`](Self::tags_by_scope_and_name) over a
    /// list of scopes.
    ///
    /// The global scope is taken out of the list and resolved through the
    /// projection; the remaining scopes are fetched with one query. The
    /// merged result follows the order of `scopes` and stops at the search
    /// limit.
    pub fn tags_by_scopes_and_name(
        &mut self,
        scopes: &[String],
        name: &str,
        partial: bool,
    ) -> Vec<TagEntry> {
        if scopes.is_empty() || name.is_empty() {
            return vec![];
        }
        let limit = self.search_limit();

        let mut global = Vec::new();
        if scopes.iter().any(|s| s == GLOBAL_SCOPE) {
            global = self.tags_by_scope_and_name(GLOBAL_SCOPE, name, partial);
        }

        let named: Vec<&str> = scopes
            .iter()
            .map(String::as_str)
            .filter(|s| *s != GLOBAL_SCOPE)
            .collect();
        let mut scoped = Vec::new();
        if !named.is_empty() {
            let mut q = SqlQuery::select_tags();
            q.is_in("scope", &named)
                .name_part(name, partial, true, self.options.case_sensitive)
                .remaining_limit(limit, global.len());
            self.fetch_into(&q, &mut scoped);
        }

        let mut tags = Vec::with_capacity(global.len() + scoped.len());
        let mut merged = HashSet::new();
        for scope in scopes {
            if !merged.insert(scope.as_str()) {
                continue;
            }
            if scope == GLOBAL_SCOPE {
                tags.append(&mut global);
            } else {
                tags.extend(scoped.iter().filter(|t| &t.scope == scope).cloned());
            }
            if tags.len() >= limit {
                tags.truncate(limit);
                break;
            }
        }
        tags
    }

    /// Tags of the given kinds, scope by scope in list order. Stops early
    /// once the search limit is reached.
    pub fn tags_by_scopes_and_kind(&mut self, scopes: &[String], kinds: &[String]) -> Vec<TagEntry> {
        if kinds.is_empty() || scopes.is_empty() {
            return vec![];
        }
        let limit = self.search_limit();

        let mut tags = Vec::new();
        for scope in scopes {
            let mut q = SqlQuery::select_tags();
            q.eq("scope", scope.to_string())
                .order_by(Some(Ordering::asc(OrderColumn::Name)))
                .remaining_limit(limit, tags.len());

            let mut scope_results = Vec::new();
            self.fetch_filtered_into(&q, kinds, &mut scope_results);
            tags.append(&mut scope_results);
            if tags.len() >= limit {
                break;
            }
        }
        tags
    }

    /// Tags of the given kinds in `scope`, optionally restricted to names
    /// starting with `filter`
    pub fn tags_by_scope_and_kind(&mut self, scope: &str, kinds: &[String], filter: &str) -> Vec<TagEntry> {
        if kinds.is_empty() {
            return vec![];
        }
        let mut q = SqlQuery::select_tags();
        q.eq("scope", scope.to_string());
        if !filter.is_empty() {
            q.push(" AND ").like("name", format!("{}%", escape_like(filter)));
        }
        q.push(" AND ").is_in("kind", kinds).limit(self.search_limit());
        self.fetch(&q)
    }

    // =========================================================================
    // By kind / path
    // =========================================================================

    pub fn tags_by_kind(&mut self, kinds: &[String], ordering: Option<Ordering>) -> Vec<TagEntry> {
        if kinds.is_empty() {
            return vec![];
        }
        let mut q = SqlQuery::select_tags();
        q.is_in("kind", kinds)
            .order_by(ordering)
            .limit(self.search_limit());
        self.fetch(&q)
    }

    pub fn tags_by_path(&mut self, paths: &[String]) -> Vec<TagEntry> {
        if paths.is_empty() {
            return vec![];
        }
        let mut q = SqlQuery::select_tags();
        q.is_in("path", paths).limit(self.search_limit());
        self.fetch(&q)
    }

    pub fn tags_by_path_limit(&mut self, path: &str, limit: usize) -> Vec<TagEntry> {
        if path.is_empty() {
            return vec![];
        }
        let mut q = SqlQuery::select_tags();
        q.eq("path", path.to_string())
            .limit(limit.min(self.search_limit()));
        self.fetch(&q)
    }

    /// Tags at `path` with one of `kinds` (any kind when empty), by id
    pub fn tags_by_path_and_kind(&mut self, path: &str, kinds: &[String], limit: usize) -> Vec<TagEntry> {
        if path.is_empty() {
            return vec![];
        }
        let mut q = SqlQuery::select_tags();
        q.eq("path", path.to_string());
        if !kinds.is_empty() {
            q.push(" AND ").is_in("kind", kinds);
        }
        q.order_by(Some(Ordering::asc(OrderColumn::Id)))
            .limit(limit.min(self.search_limit()));
        self.fetch(&q)
    }

    /// Tags at `path`, keeping only `kinds`. The kind filter is applied to
    /// the fetched rows and is part of the cache key.
    pub fn tags_by_kind_and_path(&mut self, kinds: &[String], path: &str) -> Vec<TagEntry> {
        if kinds.is_empty() {
            return vec![];
        }
        let mut q = SqlQuery::select_tags();
        q.eq("path", path.to_string()).limit(self.search_limit());

        let mut tags = Vec::new();
        self.fetch_filtered_into(&q, kinds, &mut tags);
        tags
    }

    /// Tags whose path contains every one of `parts`
    pub fn tags_by_path_parts(&mut self, parts: &[String]) -> Vec<TagEntry> {
        if parts.is_empty() {
            return vec![];
        }
        let mut q = SqlQuery::select_tags();
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                q.push(" AND ");
            }
            q.like("path", format!("%{}%", escape_like(part)));
        }
        q.limit(self.search_limit());
        self.fetch(&q)
    }

    // =========================================================================
    // By name
    // =========================================================================

    /// Tags named `prefix`, or starting with it unless `exact`
    pub fn tags_by_name(&mut self, prefix: &str, exact: bool) -> Vec<TagEntry> {
        if prefix.is_empty() {
            return vec![];
        }
        let mut q = SqlQuery::select_tags();
        q.name_part(prefix, !exact, false, self.options.case_sensitive)
            .limit(self.search_limit());
        self.fetch(&q)
    }

    pub fn tag_by_name_limit_one(&mut self, name: &str) -> Option<TagEntry> {
        if name.is_empty() {
            return None;
        }
        let mut q = SqlQuery::select_tags();
        q.name_part(name, false, false, self.options.case_sensitive)
            .limit(1);
        self.fetch(&q).into_iter().next()
    }

    /// Tags whose name contains `part`
    pub fn tags_by_part_name(&mut self, part: &str) -> Vec<TagEntry> {
        if part.is_empty() {
            return vec![];
        }
        let mut q = SqlQuery::select_tags();
        q.like("name", format!("%{}%", escape_like(part)))
            .limit(self.search_limit());
        self.fetch(&q)
    }

    /// Tags named `name` whose parent is `parent`
    pub fn tags_by_name_and_parent(&mut self, name: &str, parent: &str) -> Vec<TagEntry> {
        if name.is_empty() {
            return vec![];
        }
        let mut q = SqlQuery::select_tags();
        q.eq("name", name.to_string()).limit(self.search_limit());
        self.fetch(&q)
            .into_iter()
            .filter(|tag| tag.parent == parent)
            .collect()
    }

    /// Parameters of the function at `function_path`, in declaration order
    pub fn parameters(&mut self, function_path: &str) -> Vec<TagEntry> {
        self.children_of_kind(function_path, kind::PARAMETER)
    }

    /// Functions declared inside `parent_function`
    pub fn lambdas(&mut self, parent_function: &str) -> Vec<TagEntry> {
        self.children_of_kind(parent_function, kind::FUNCTION)
    }

    fn children_of_kind(&mut self, scope: &str, kind: &str) -> Vec<TagEntry> {
        let mut q = SqlQuery::select_tags();
        q.eq("kind", kind.to_string())
            .push(" AND ")
            .eq("scope", scope.to_string())
            .order_by(Some(Ordering::asc(OrderColumn::Id)))
            .limit(self.search_limit());
        self.fetch(&q)
    }

    /// `operator->` declared in `scope`
    pub fn dereference_operator(&mut self, scope: &str) -> Option<TagEntry> {
        self.operator_in_scope(scope, "operator%->%")
    }

    /// `operator[]` declared in `scope`
    pub fn subscript_operator(&mut self, scope: &str) -> Option<TagEntry> {
        self.operator_in_scope(scope, "operator%[%]%")
    }

    fn operator_in_scope(&mut self, scope: &str, pattern: &str) -> Option<TagEntry> {
        let mut q = SqlQuery::select_tags();
        q.eq("scope", scope.to_string())
            .push(" AND name LIKE ")
            .bind(pattern.to_string())
            .limit(1);
        self.fetch(&q).into_iter().next()
    }

    // =========================================================================
    // Type resolution
    // =========================================================================

    /// Best-effort resolution of a possibly qualified type name seen from
    /// `scope`.
    ///
    /// `Outer::Inner` seen from `NS` looks for class/struct/typedef tags
    /// named `Inner` and picks, in order of precedence:
    /// 1. a candidate whose scope is exactly `NS::Outer`
    /// 2. a candidate whose parent is `Outer`
    /// 3. the only candidate, when there is exactly one other
    pub fn resolve_type_scope(&mut self, type_name: &str, scope: &str) -> Option<TypeScope> {
        let (qualifier, stripped) = match type_name.rfind(':') {
            Some(pos) => (
                type_name[..pos].trim_end_matches(':'),
                &type_name[pos + 1..],
            ),
            None => ("", type_name),
        };
        if stripped.is_empty() {
            return None;
        }

        let mut wanted_scope = scope.to_string();
        if !qualifier.is_empty() {
            wanted_scope.push_str("::");
            wanted_scope.push_str(qualifier);
        }
        let wanted_parent = wanted_scope
            .rsplit(':')
            .next()
            .unwrap_or(&wanted_scope)
            .to_string();

        let mut q = SqlQuery::new("SELECT scope, parent FROM tags WHERE ");
        q.eq("name", stripped.to_string())
            .push(" AND ")
            .is_in("kind", &TYPE_KINDS)
            .limit(TYPE_SAMPLE_LIMIT);

        let candidates = match self.scope_candidates(&q) {
            Ok(rows) => rows,
            Err(err) => {
                self.handle_query_error(q.sql(), err);
                return None;
            }
        };

        let resolved = |scope: &str| TypeScope {
            name: stripped.to_string(),
            scope: scope.to_string(),
        };

        let mut best_scope = String::new();
        let mut others = 0usize;
        let mut last_scope = String::new();
        for (found_scope, found_parent) in candidates {
            if found_scope == wanted_scope {
                return Some(resolved(&found_scope));
            } else if found_parent == wanted_parent {
                best_scope = found_scope.clone();
            } else {
                others += 1;
            }
            last_scope = found_scope;
        }

        if !best_scope.is_empty() {
            Some(resolved(&best_scope))
        } else if others == 1 {
            Some(resolved(&last_scope))
        } else {
            None
        }
    }

    fn scope_candidates(&self, q: &SqlQuery) -> Result<Vec<(String, String)>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(q.sql()).map_err(StoreError::query)?;
        let rows = stmt
            .query_map(params_from_iter(q.params()), |row| {
                Ok((
                    row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                    row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                ))
            })
            .map_err(StoreError::query)?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::query)
    }

    /// Whether a class, struct or typedef exists at `scope::type_name`
    pub fn type_and_scope_exists(&mut self, type_name: &str, scope: &str) -> bool {
        let path = if scope.is_empty() || scope == GLOBAL_SCOPE {
            type_name.to_string()
        } else {
            format!("{}::{}", scope, type_name)
        };

        let mut q = SqlQuery::new("SELECT id FROM tags WHERE ");
        q.eq("path", path).push(" AND ").is_in("kind", &TYPE_KINDS).limit(1);

        let found = self.conn().and_then(|conn| {
            conn.query_row(q.sql(), params_from_iter(q.params()), |row| {
                row.get::<_, i64>(0)
            })
            .optional()
            .map_err(StoreError::query)
        });
        match found {
            Ok(id) => id.is_some(),
            Err(err) => {
                self.handle_query_error(q.sql(), err);
                false
            }
        }
    }

    // =========================================================================
    // Files
    // =========================================================================

    /// All known files, ordered by path
    pub fn files(&mut self) -> Vec<FileEntry> {
        let q = SqlQuery::new(&format!("SELECT {} FROM files ORDER BY file", FILE_COLUMNS));
        self.query_files(&q)
    }

    /// Files whose name starts with `partial`. When `partial` ends with a
    /// path separator the full path is matched instead of the file name.
    pub fn files_matching(&mut self, partial: &str) -> Vec<FileEntry> {
        let match_path = partial.ends_with('/') || partial.ends_with('\\');

        let mut q = SqlQuery::new(&format!("SELECT {} FROM files WHERE ", FILE_COLUMNS));
        q.like("file", format!("%{}%", escape_like(partial)))
            .push(" ORDER BY file");

        self.query_files(&q)
            .into_iter()
            .filter(|entry| {
                let candidate = if match_path {
                    entry.file.as_str()
                } else {
                    file_name(&entry.file)
                };
                candidate.starts_with(partial)
            })
            .collect()
    }

    /// Completion candidates for a typed path fragment: each matching file
    /// path from the fragment onwards, with `/` separators
    pub fn files_for_completion(&mut self, typed: &str) -> Vec<String> {
        let pattern = typed.replace('\\', "/");

        let mut q = SqlQuery::new(&format!("SELECT {} FROM files WHERE ", FILE_COLUMNS));
        q.push("REPLACE(file, '\\', '/') LIKE ")
            .bind(format!("%{}%", escape_like(&pattern)))
            .push(" ESCAPE '^' ORDER BY file");

        self.query_files(&q)
            .into_iter()
            .filter_map(|entry| {
                let file = entry.file.replace('\\', "/");
                file.find(&pattern).map(|pos| file[pos..].to_string())
            })
            .collect()
    }

    fn query_files(&mut self, q: &SqlQuery) -> Vec<FileEntry> {
        let result = self.conn().and_then(|conn| {
            let mut stmt = conn.prepare(q.sql()).map_err(StoreError::query)?;
            let rows = stmt
                .query_map(params_from_iter(q.params()), file_from_row)
                .map_err(StoreError::query)?;
            rows.collect::<Result<Vec<_>, _>>()
                .map_err(StoreError::query)
        });
        match result {
            Ok(files) => files,
            Err(err) => {
                self.handle_query_error(q.sql(), err);
                vec![]
            }
        }
    }

    // =========================================================================
    // Macros
    // =========================================================================

    pub fn get_macro(&mut self, name: &str) -> Option<PPToken> {
        let sql = format!("SELECT {} FROM macros WHERE name = ?1", MACRO_COLUMNS);
        let result = self.conn().and_then(|conn| {
            conn.query_row(&sql, params![name], pp_token_from_row)
                .optional()
                .map_err(StoreError::query)
        });
        match result {
            Ok(token) => token,
            Err(err) => {
                self.handle_query_error(&sql, err);
                None
            }
        }
    }

    pub fn simple_macros_for_file(&mut self, file: &str) -> Vec<String> {
        let sql = "SELECT name FROM simple_macros WHERE file = ?1 ORDER BY id";
        let result = self.conn().and_then(|conn| {
            let mut stmt = conn.prepare(sql).map_err(StoreError::query)?;
            let rows = stmt
                .query_map(params![file], |row| {
                    Ok(row.get::<_, Option<String>>(0)?.unwrap_or_default())
                })
                .map_err(StoreError::query)?;
            rows.collect::<Result<Vec<_>, _>>()
                .map_err(StoreError::query)
        });
        match result {
            Ok(names) => names,
            Err(err) => {
                self.handle_query_error(sql, err);
                vec![]
            }
        }
    }
}

fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
