//! In-memory result cache
//!
//! Maps the text of a built query (plus its kind filter) to the rows it
//! produced. There is no capacity bound and no expiry; the store clears the
//! whole cache on any mutation, on an explicit request and when switching
//! to another database file.

use std::collections::HashMap;

use tracing::trace;

use crate::core::tag::TagEntry;

#[derive(Debug, Default)]
pub(super) struct ResultCache {
    entries: HashMap<String, Vec<TagEntry>>,
}

impl ResultCache {
    /// Cache key for a query; each kind filter is appended in order
    pub fn key(query: &str, kinds: &[String]) -> String {
        let mut key = query.to_string();
        for kind in kinds {
            key.push('@');
            key.push_str(kind);
        }
        key
    }

    /// Append the cached rows for `key` to `out`. Returns `true` on a hit.
    pub fn lookup(&self, key: &str, out: &mut Vec<TagEntry>) -> bool {
        match self.entries.get(key) {
            Some(rows) => {
                trace!(rows = rows.len(), "cache hit: {}", key);
                out.extend(rows.iter().cloned());
                true
            }
            None => false,
        }
    }

    /// Replace the entry for `key`.
    ///
    /// Result sets containing anonymous-scope tags are not cached, their
    /// scope names change on every parse of the owning file.
    pub fn store(&mut self, key: &str, rows: &[TagEntry]) {
        self.entries.remove(key);
        if rows.iter().any(TagEntry::is_anonymous_scope) {
            return;
        }
        self.entries.insert(key.to_string(), rows.to_vec());
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tag::kind;

    fn tag(name: &str, scope: &str) -> TagEntry {
        TagEntry::new(name, "a.cpp", 1, kind::VARIABLE).in_scope(scope)
    }

    #[test]
    fn test_lookup_appends_to_existing_rows() {
        let mut cache = ResultCache::default();
        cache.store("q1", &[tag("a", "ns")]);

        let mut out = vec![tag("first", "ns")];
        assert!(cache.lookup("q1", &mut out));
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].name, "a");

        assert!(!cache.lookup("q2", &mut out));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_kind_filters_make_distinct_keys() {
        let kinds = vec!["class".to_string(), "struct".to_string()];
        assert_eq!(ResultCache::key("q", &kinds), "q@class@struct");
        assert_ne!(ResultCache::key("q", &kinds), ResultCache::key("q", &[]));
    }

    #[test]
    fn test_anonymous_scope_results_are_not_cached() {
        let mut cache = ResultCache::default();
        cache.store("q", &[tag("a", "ns")]);
        assert_eq!(cache.len(), 1);

        // Replacing with an uncacheable result drops the old entry too
        cache.store("q", &[tag("a", "ns"), tag("i", "__anon_7")]);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut cache = ResultCache::default();
        cache.store("q1", &[tag("a", "ns")]);
        cache.store("q2", &[]);
        cache.clear();
        assert!(cache.is_empty());
    }
}
