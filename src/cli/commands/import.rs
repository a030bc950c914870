//! `tagdb import` command - Load tag batches into the database
//!
//! Input files are JSON, either a bare array of tags or a bundle carrying
//! macros as well:
//!
//! ```json
//! {
//!   "tags": [{ "name": "Foo", "file": "foo.h", "line": 3, "kind": "class" }],
//!   "macros": [{ "name": "MAX", "file": "foo.h", "line": 1,
//!                "is_function_like": true, "signature": "(a,b)" }],
//!   "simple_macros": { "foo.h": ["NDEBUG"] }
//! }
//! ```
//!
//! Directories are walked for `*.tags.json` files. All tag batches are
//! stored in one transaction.

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::cli::helpers::open_store;
use crate::cli::GlobalOpts;
use crate::core::{MacroEntry, StoreStats, TagEntry, GLOBAL_SCOPE};

/// Suffix of tag files picked up when walking a directory
const TAG_FILE_SUFFIX: &str = ".tags.json";

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// Tag files or directories containing *.tags.json files
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Disable the result cache while importing
    #[arg(long)]
    pub no_cache: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TagFile {
    Tags(Vec<TagEntry>),
    Bundle {
        #[serde(default)]
        tags: Vec<TagEntry>,
        #[serde(default)]
        macros: Vec<MacroEntry>,
        #[serde(default)]
        simple_macros: BTreeMap<String, Vec<String>>,
    },
}

/// Expand directories into the tag files they contain, in path order
fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .filter(|e| {
                    e.file_name()
                        .to_str()
                        .is_some_and(|name| name.ends_with(TAG_FILE_SUFFIX))
                })
                .map(|e| e.into_path())
                .collect();
            found.sort();
            inputs.extend(found);
        } else if path.exists() {
            inputs.push(path.clone());
        } else {
            return Err(miette::miette!("No such file or directory: {}", path.display()));
        }
    }
    Ok(inputs)
}

/// Fill in scope and path for tags written without them
fn normalize(tag: &mut TagEntry) {
    if tag.scope.is_empty() {
        tag.scope = GLOBAL_SCOPE.to_string();
    }
    if tag.path.is_empty() {
        tag.path = if tag.scope == GLOBAL_SCOPE {
            tag.name.clone()
        } else {
            format!("{}::{}", tag.scope, tag.name)
        };
    }
}

fn read_tag_file(path: &Path) -> Result<TagFile> {
    let contents = fs::read_to_string(path)
        .map_err(|e| miette::miette!("Failed to read {}: {}", path.display(), e))?;
    serde_json::from_str(&contents)
        .map_err(|e| miette::miette!("Invalid tag file {}: {}", path.display(), e))
}

pub fn run(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    let inputs = collect_inputs(&args.paths)?;
    if inputs.is_empty() {
        println!("{} No tag files found", style("!").yellow());
        return Ok(());
    }

    let mut store = open_store(global)?;
    if args.no_cache {
        store.set_use_cache(false);
    }

    let mut macros = Vec::new();
    let mut simple_macros = BTreeMap::new();
    let mut totals = StoreStats::default();

    store.begin().into_diagnostic()?;
    for input in &inputs {
        let (mut tags, file_macros, file_simple) = match read_tag_file(input) {
            Ok(TagFile::Tags(tags)) => (tags, Vec::new(), BTreeMap::new()),
            Ok(TagFile::Bundle {
                tags,
                macros,
                simple_macros,
            }) => (tags, macros, simple_macros),
            Err(e) => {
                let _ = store.rollback();
                return Err(e);
            }
        };

        tags.iter_mut().for_each(normalize);
        match store.store(&tags, false) {
            Ok(stats) => {
                totals.files_replaced += stats.files_replaced;
                totals.tags_removed += stats.tags_removed;
                totals.tags_inserted += stats.tags_inserted;
                totals.tags_skipped += stats.tags_skipped;
            }
            Err(e) => {
                let _ = store.rollback();
                return Err(miette::miette!("Import of {} failed: {}", input.display(), e));
            }
        }
        macros.extend(file_macros);
        simple_macros.extend(file_simple);
    }
    store.commit().into_diagnostic()?;

    // Macro writes run in their own transactions
    let macro_count = store.store_macros(&macros).into_diagnostic()?;
    for (file, names) in &simple_macros {
        store.store_simple_macros(file, names).into_diagnostic()?;
    }

    println!(
        "{} Imported {} tag file(s)",
        style("✓").green(),
        inputs.len()
    );
    println!("  Source files:  {}", style(totals.files_replaced).cyan());
    println!("  Tags stored:   {}", style(totals.tags_inserted).cyan());
    if totals.tags_removed > 0 {
        println!("  Tags replaced: {}", style(totals.tags_removed).yellow());
    }
    if totals.tags_skipped > 0 {
        println!("  Tags skipped:  {}", style(totals.tags_skipped).dim());
    }
    if macro_count > 0 {
        println!("  Macros:        {}", style(macro_count).cyan());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_plain_array() {
        let json = r#"[{"name": "Foo", "file": "foo.h", "line": 3, "kind": "class"}]"#;
        match serde_json::from_str::<TagFile>(json).unwrap() {
            TagFile::Tags(tags) => {
                assert_eq!(tags.len(), 1);
                assert_eq!(tags[0].name, "Foo");
                assert_eq!(tags[0].scope, "");
            }
            TagFile::Bundle { .. } => panic!("expected a plain array"),
        }
    }

    #[test]
    fn test_parse_bundle() {
        let json = r#"{
            "tags": [{"name": "Foo", "file": "foo.h", "line": 3, "kind": "class"}],
            "macros": [{"name": "MAX", "file": "foo.h", "line": 1, "signature": "(a,b)"}],
            "simple_macros": {"foo.h": ["NDEBUG"]}
        }"#;
        match serde_json::from_str::<TagFile>(json).unwrap() {
            TagFile::Bundle {
                tags,
                macros,
                simple_macros,
            } => {
                assert_eq!(tags.len(), 1);
                assert_eq!(macros[0].name, "MAX");
                assert_eq!(simple_macros["foo.h"], vec!["NDEBUG"]);
            }
            TagFile::Tags(_) => panic!("expected a bundle"),
        }
    }

    #[test]
    fn test_normalize_fills_scope_and_path() {
        let mut global = TagEntry {
            name: "Foo".to_string(),
            ..Default::default()
        };
        normalize(&mut global);
        assert_eq!(global.scope, GLOBAL_SCOPE);
        assert_eq!(global.path, "Foo");

        let mut member = TagEntry {
            name: "size".to_string(),
            scope: "Vec".to_string(),
            ..Default::default()
        };
        normalize(&mut member);
        assert_eq!(member.path, "Vec::size");
    }

    #[test]
    fn test_collect_inputs_walks_directories() {
        let tmp = tempdir().unwrap();
        let nested = tmp.path().join("src/util");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("b.tags.json"), "[]").unwrap();
        fs::write(tmp.path().join("a.tags.json"), "[]").unwrap();
        fs::write(tmp.path().join("notes.json"), "[]").unwrap();

        let inputs = collect_inputs(&[tmp.path().to_path_buf()]).unwrap();
        assert_eq!(inputs.len(), 2);
        assert!(inputs.iter().all(|p| p.to_string_lossy().ends_with(TAG_FILE_SUFFIX)));

        assert!(collect_inputs(&[tmp.path().join("missing.json")]).is_err());
    }
}
