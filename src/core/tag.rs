//! Tag value types
//!
//! Values handed out by the store are copies of persisted rows: mutating a
//! returned [`TagEntry`] never touches the database.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Scope value for symbols not nested in any named construct
pub const GLOBAL_SCOPE: &str = "<global>";

/// Prefix of the synthetic scope names given to unnamed blocks.
/// These are regenerated on every parse of a file.
pub const ANONYMOUS_SCOPE_PREFIX: &str = "__anon";

/// Well-known tag kinds
pub mod kind {
    pub const CLASS: &str = "class";
    pub const STRUCT: &str = "struct";
    pub const TYPEDEF: &str = "typedef";
    pub const NAMESPACE: &str = "namespace";
    pub const FUNCTION: &str = "function";
    pub const PROTOTYPE: &str = "prototype";
    pub const MEMBER: &str = "member";
    pub const VARIABLE: &str = "variable";
    pub const PARAMETER: &str = "parameter";
    pub const LOCAL: &str = "local";
    pub const MACRO: &str = "macro";
    pub const ENUM: &str = "enum";
    pub const ENUMERATOR: &str = "enumerator";
    pub const UNION: &str = "union";
    pub const UNKNOWN: &str = "<unknown>";
}

/// One indexed symbol occurrence
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TagEntry {
    /// Store-assigned row id, `None` until persisted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub file: String,
    pub line: i64,
    pub kind: String,
    pub access: String,
    pub signature: String,
    /// Source snippet the parser matched
    pub pattern: String,
    pub parent: String,
    pub inherits: Vec<String>,
    /// Fully-qualified path of the symbol
    pub path: String,
    pub typeref: String,
    pub scope: String,
    pub template_definition: String,
    pub tag_properties: String,
    pub macrodef: String,
}

impl TagEntry {
    /// Create a tag with the fields every candidate carries
    pub fn new(name: &str, file: &str, line: i64, kind: &str) -> Self {
        Self {
            name: name.to_string(),
            file: file.to_string(),
            line,
            kind: kind.to_string(),
            scope: GLOBAL_SCOPE.to_string(),
            path: name.to_string(),
            ..Default::default()
        }
    }

    /// Place the tag inside `scope`, deriving its parent and path
    pub fn in_scope(mut self, scope: &str) -> Self {
        self.scope = scope.to_string();
        if scope.is_empty() || scope == GLOBAL_SCOPE {
            self.parent = String::new();
            self.path = self.name.clone();
        } else {
            self.parent = scope.rsplit("::").next().unwrap_or(scope).to_string();
            self.path = format!("{}::{}", scope, self.name);
        }
        self
    }

    /// Dummy entries produced by the parser are not stored
    pub fn is_ok(&self) -> bool {
        !self.file.is_empty() && !self.kind.is_empty() && self.kind != kind::UNKNOWN
    }

    pub fn is_local_variable(&self) -> bool {
        self.kind == kind::LOCAL
    }

    pub fn is_global(&self) -> bool {
        self.scope == GLOBAL_SCOPE
    }

    pub fn is_anonymous_scope(&self) -> bool {
        self.scope.starts_with(ANONYMOUS_SCOPE_PREFIX)
    }

    pub fn is_function(&self) -> bool {
        self.kind == kind::FUNCTION
    }

    pub fn is_container(&self) -> bool {
        matches!(
            self.kind.as_str(),
            kind::CLASS | kind::STRUCT | kind::UNION | kind::NAMESPACE
        )
    }

    /// Inherits list in its persisted, comma separated form
    pub fn inherits_as_string(&self) -> String {
        self.inherits.join(",")
    }

    /// Parse the persisted form of the inherits list
    pub fn parse_inherits(s: &str) -> Vec<String> {
        s.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect()
    }
}

/// A file known to the store and when it was last re-tagged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub id: i64,
    pub file: String,
    /// Unix timestamp (seconds)
    pub last_retagged: i64,
}

impl FileEntry {
    pub fn last_retagged_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.last_retagged, 0)
            .single()
            .unwrap_or(DateTime::UNIX_EPOCH)
    }
}

/// A preprocessor macro definition as stored in the macros table
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MacroEntry {
    pub name: String,
    pub file: String,
    pub line: i64,
    pub is_function_like: bool,
    pub replacement: String,
    /// Parenthesized parameter list, e.g. `(a,b)`
    pub signature: String,
}

/// Preprocessor token materialized from the macros table
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PPToken {
    pub name: String,
    pub replacement: String,
    pub line: i64,
    pub is_function_like: bool,
    pub args: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_scope_derives_parent_and_path() {
        let tag = TagEntry::new("bar", "a.cpp", 3, kind::FUNCTION).in_scope("ns::Foo");
        assert_eq!(tag.parent, "Foo");
        assert_eq!(tag.path, "ns::Foo::bar");
        assert!(!tag.is_global());

        let tag = tag.in_scope(GLOBAL_SCOPE);
        assert_eq!(tag.parent, "");
        assert_eq!(tag.path, "bar");
        assert!(tag.is_global());
    }

    #[test]
    fn test_local_and_dummy_entries() {
        let local = TagEntry::new("i", "a.cpp", 10, kind::LOCAL);
        assert!(local.is_local_variable());
        assert!(local.is_ok());

        let dummy = TagEntry::new("x", "a.cpp", 1, kind::UNKNOWN);
        assert!(!dummy.is_ok());

        let no_file = TagEntry::new("x", "", 1, kind::FUNCTION);
        assert!(!no_file.is_ok());
    }

    #[test]
    fn test_inherits_round_trip_skips_empty_items() {
        let mut tag = TagEntry::new("Derived", "a.h", 1, kind::CLASS);
        tag.inherits = vec!["Base".to_string(), "Mixin".to_string()];
        assert_eq!(tag.inherits_as_string(), "Base,Mixin");
        assert_eq!(TagEntry::parse_inherits("Base,,Mixin"), tag.inherits);
        assert!(TagEntry::parse_inherits("").is_empty());
    }

    #[test]
    fn test_anonymous_scope_detection() {
        let tag = TagEntry::new("x", "a.cpp", 1, kind::VARIABLE).in_scope("__anon_3");
        assert!(tag.is_anonymous_scope());
    }
}
