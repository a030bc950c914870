//! Shared helper functions for CLI commands

use miette::{IntoDiagnostic, Result};

use crate::cli::GlobalOpts;
use crate::core::{Config, SqliteTagsStore};

/// Open the tags database selected by `--db` or the layered config
pub fn open_store(global: &GlobalOpts) -> Result<SqliteTagsStore> {
    let config = Config::load(global.config.as_deref()).into_diagnostic()?;
    let path = global.db.clone().unwrap_or_else(|| config.database());

    SqliteTagsStore::open_path(&path, config.store_options())
        .map_err(|e| miette::miette!("Cannot open tags database {}: {}", path.display(), e))
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
