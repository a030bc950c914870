//! SQL builder for the retrieval family
//!
//! Predicates are assembled as text with `?` placeholders and the values
//! are bound separately. The rendered text plus the bound values form the
//! result cache key.

use rusqlite::types::Value;

use super::materialize::TAG_COLUMNS;
use super::{OrderDirection, Ordering};

/// Escape character used in every LIKE pattern
const LIKE_ESCAPE: char = '^';

#[derive(Debug, Clone)]
pub(super) struct SqlQuery {
    sql: String,
    params: Vec<Value>,
}

impl SqlQuery {
    /// `SELECT <tag columns> FROM tags WHERE `
    pub fn select_tags() -> Self {
        Self {
            sql: format!("SELECT {} FROM tags WHERE ", TAG_COLUMNS),
            params: Vec::new(),
        }
    }

    pub fn new(sql: &str) -> Self {
        Self {
            sql: sql.to_string(),
            params: Vec::new(),
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Cache key: the SQL text followed by its bound values
    pub fn cache_key(&self) -> String {
        format!("{} {:?}", self.sql, self.params)
    }

    pub fn push(&mut self, sql: &str) -> &mut Self {
        self.sql.push_str(sql);
        self
    }

    /// Append a placeholder bound to `value`
    pub fn bind(&mut self, value: impl Into<Value>) -> &mut Self {
        self.sql.push('?');
        self.params.push(value.into());
        self
    }

    /// `column = ?`
    pub fn eq(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.push(column).push(" = ").bind(value)
    }

    /// `column IN (?, ?, ...)`. Callers guarantee `values` is not empty.
    pub fn is_in<S: AsRef<str>>(&mut self, column: &str, values: &[S]) -> &mut Self {
        self.push(column).push(" IN (");
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.bind(value.as_ref().to_string());
        }
        self.push(")")
    }

    /// `column LIKE ? ESCAPE '^'`
    pub fn like(&mut self, column: &str, pattern: String) -> &mut Self {
        self.push(column)
            .push(" LIKE ")
            .bind(pattern)
            .push(&format!(" ESCAPE '{}'", LIKE_ESCAPE))
    }

    /// Add the name predicate.
    ///
    /// With `case_sensitive == false` a partial name is a case-insensitive
    /// LIKE prefix match. Otherwise LIKE is avoided entirely and the prefix
    /// becomes the binary range `[name, until)`, where `until` is the name
    /// with its last character incremented.
    pub fn name_part(
        &mut self,
        name: &str,
        partial: bool,
        prepend_and: bool,
        case_sensitive: bool,
    ) -> &mut Self {
        if name.is_empty() {
            return self;
        }
        if prepend_and {
            self.push(" AND ");
        }

        if !partial {
            return self.eq("name", name.to_string());
        }

        if !case_sensitive {
            return self.like("name", format!("{}%", escape_like(name)));
        }

        match increment_last_char(name) {
            Some(until) => self
                .push("name >= ")
                .bind(name.to_string())
                .push(" AND name < ")
                .bind(until),
            None => self.push("name >= ").bind(name.to_string()),
        }
    }

    pub fn limit(&mut self, limit: usize) -> &mut Self {
        self.push(&format!(" LIMIT {}", limit))
    }

    /// Limit to whatever is left of `ceiling` once `already` rows were
    /// gathered, but always at least one row.
    pub fn remaining_limit(&mut self, ceiling: usize, already: usize) -> &mut Self {
        self.limit(ceiling.saturating_sub(already).max(1))
    }

    pub fn order_by(&mut self, ordering: Option<Ordering>) -> &mut Self {
        let Some(ordering) = ordering else {
            return self;
        };
        self.push(" ORDER BY ").push(ordering.column.as_sql());
        match ordering.direction {
            OrderDirection::Asc => self.push(" ASC"),
            OrderDirection::Desc => self.push(" DESC"),
            OrderDirection::None => self,
        }
    }
}

/// Escape LIKE meta characters so `_` matches literally
pub(super) fn escape_like(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for ch in s.chars() {
        if ch == LIKE_ESCAPE || ch == '_' || ch == '%' {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(ch);
    }
    escaped
}

/// Upper bound of a prefix range: `foo` -> `fop`
pub(super) fn increment_last_char(s: &str) -> Option<String> {
    let mut chars: Vec<char> = s.chars().collect();
    // A trailing char::MAX has no successor; carry into the previous char
    while let Some(last) = chars.pop() {
        let next = match last {
            '\u{D7FF}' => Some('\u{E000}'),
            c => char::from_u32(c as u32 + 1),
        };
        if let Some(next) = next {
            chars.push(next);
            return Some(chars.into_iter().collect());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::OrderColumn;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("m_name"), "m^_name");
        assert_eq!(escape_like("50%"), "50^%");
        assert_eq!(escape_like("a^b"), "a^^b");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_increment_last_char() {
        assert_eq!(increment_last_char("foo").as_deref(), Some("fop"));
        assert_eq!(increment_last_char("Get").as_deref(), Some("Geu"));
        assert_eq!(increment_last_char(""), None);

        // Surrogates are skipped and char::MAX carries
        assert_eq!(increment_last_char("a\u{D7FF}").as_deref(), Some("a\u{E000}"));
        assert_eq!(increment_last_char("a\u{10FFFF}").as_deref(), Some("b"));
        assert_eq!(
            increment_last_char("ab\u{10FFFF}\u{10FFFF}").as_deref(),
            Some("ac")
        );
        assert_eq!(increment_last_char("\u{10FFFF}"), None);
    }

    #[test]
    fn test_name_part_modes() {
        let mut q = SqlQuery::new("");
        q.name_part("m_x", true, false, false);
        assert_eq!(q.sql(), "name LIKE ? ESCAPE '^'");
        assert_eq!(q.params(), &[Value::Text("m^_x%".to_string())]);

        let mut q = SqlQuery::new("");
        q.name_part("Foo", true, true, true);
        assert_eq!(q.sql(), " AND name >= ? AND name < ?");
        assert_eq!(
            q.params(),
            &[Value::Text("Foo".to_string()), Value::Text("Fop".to_string())]
        );

        let mut q = SqlQuery::new("");
        q.name_part("Foo", false, false, true);
        assert_eq!(q.sql(), "name = ?");

        let mut q = SqlQuery::new("x");
        q.name_part("", true, true, false);
        assert_eq!(q.sql(), "x");
    }

    #[test]
    fn test_in_list_and_limits() {
        let mut q = SqlQuery::new("");
        q.is_in("kind", &["class", "struct"]).remaining_limit(10, 4);
        assert_eq!(q.sql(), "kind IN (?, ?) LIMIT 6");

        let mut q = SqlQuery::new("");
        q.remaining_limit(10, 12);
        assert_eq!(q.sql(), " LIMIT 1");
    }

    #[test]
    fn test_cache_key_includes_bound_values() {
        let mut a = SqlQuery::select_tags();
        a.eq("file", "a.cpp".to_string());
        let mut b = SqlQuery::select_tags();
        b.eq("file", "b.cpp".to_string());
        assert_ne!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_order_by() {
        let mut q = SqlQuery::new("");
        q.order_by(Some(Ordering::asc(OrderColumn::Line)));
        assert_eq!(q.sql(), " ORDER BY line ASC");

        let mut q = SqlQuery::new("");
        q.order_by(None);
        assert_eq!(q.sql(), "");
    }
}
