//! Integration tests for the tagdb CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const SAMPLE_TAGS: &str = r#"[
    {"name": "Widget", "file": "src/widget.h", "line": 3, "kind": "class", "scope": "ui"},
    {"name": "draw", "file": "src/widget.h", "line": 7, "kind": "function", "scope": "ui::Widget"},
    {"name": "m_size", "file": "src/widget.h", "line": 9, "kind": "member", "scope": "ui::Widget"},
    {"name": "tmp", "file": "src/widget.h", "line": 8, "kind": "local", "scope": "ui::Widget::draw"},
    {"name": "main", "file": "src/main.cpp", "line": 1, "kind": "function"}
]"#;

const SAMPLE_BUNDLE: &str = r#"{
    "tags": [{"name": "helper", "file": "src/util.cpp", "line": 4, "kind": "function"}],
    "macros": [{"name": "MAX", "file": "src/util.h", "line": 2, "is_function_like": true,
                "replacement": "((a)>(b)?(a):(b))", "signature": "(a, b)"}],
    "simple_macros": {"src/util.h": ["NDEBUG"]}
}"#;

/// Helper to get a tagdb command isolated from the user's config
fn tagdb(tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tagdb").unwrap();
    cmd.current_dir(tmp.path())
        .env("XDG_CONFIG_HOME", tmp.path().join("config"))
        .env("HOME", tmp.path())
        .env_remove("TAGDB_DATABASE")
        .env_remove("TAGDB_SEARCH_LIMIT")
        .env_remove("TAGDB_CASE_SENSITIVE")
        .env_remove("TAGDB_LOG");
    cmd
}

/// Helper to create a database populated with the sample tags
fn setup_imported_db() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("sample.tags.json"), SAMPLE_TAGS).unwrap();
    tagdb(&tmp)
        .args(["import", "sample.tags.json"])
        .assert()
        .success();
    tmp
}

// ============================================================================
// Basic Commands
// ============================================================================

#[test]
fn test_help_displays() {
    let tmp = TempDir::new().unwrap();
    tagdb(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("SQLite tags database"))
        .stdout(predicate::str::contains("import"))
        .stdout(predicate::str::contains("query"));
}

#[test]
fn test_version_displays() {
    let tmp = TempDir::new().unwrap();
    tagdb(&tmp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tagdb"));
}

#[test]
fn test_completions_bash() {
    let tmp = TempDir::new().unwrap();
    tagdb(&tmp)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tagdb"))
        .stdout(predicate::str::contains("resolve"));
}

// ============================================================================
// Import
// ============================================================================

#[test]
fn test_import_creates_database() {
    let tmp = setup_imported_db();
    assert!(tmp.path().join("tags.db").exists());

    tagdb(&tmp)
        .args(["--format", "json", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"tags\": 4"))
        .stdout(predicate::str::contains("\"files\": 2"));
}

#[test]
fn test_import_reports_skipped_locals() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("sample.tags.json"), SAMPLE_TAGS).unwrap();
    tagdb(&tmp)
        .args(["import", "sample.tags.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Tags stored:   4"))
        .stdout(predicate::str::contains("Tags skipped:  1"));
}

#[test]
fn test_import_is_idempotent() {
    let tmp = setup_imported_db();
    tagdb(&tmp)
        .args(["import", "sample.tags.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Tags replaced: 4"));

    tagdb(&tmp)
        .args(["--format", "json", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"tags\": 4"));
}

#[test]
fn test_import_walks_directory() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("tags");
    fs::create_dir_all(dir.join("nested")).unwrap();
    fs::write(dir.join("a.tags.json"), SAMPLE_TAGS).unwrap();
    fs::write(dir.join("nested/b.tags.json"), SAMPLE_BUNDLE).unwrap();
    fs::write(dir.join("ignored.json"), "not json").unwrap();

    tagdb(&tmp)
        .args(["import", "tags"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 2 tag file(s)"));

    tagdb(&tmp)
        .args(["query", "macro", "MAX"])
        .assert()
        .success()
        .stdout(predicate::str::contains("MAX(a, b)"));
}

#[test]
fn test_import_rejects_invalid_json() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("broken.tags.json"), "{ not json").unwrap();
    tagdb(&tmp)
        .args(["import", "broken.tags.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid tag file"));
}

#[test]
fn test_import_missing_path_fails() {
    let tmp = TempDir::new().unwrap();
    tagdb(&tmp)
        .args(["import", "nope.tags.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No such file or directory"));
}

// ============================================================================
// Queries
// ============================================================================

#[test]
fn test_query_name_prefix() {
    let tmp = setup_imported_db();
    tagdb(&tmp)
        .args(["query", "name", "dr"])
        .assert()
        .success()
        .stdout(predicate::str::contains("draw\tfunction\tui::Widget\tsrc/widget.h\t7"));
}

#[test]
fn test_query_name_underscore_is_literal() {
    let tmp = setup_imported_db();
    tagdb(&tmp)
        .args(["query", "name", "m_"])
        .assert()
        .success()
        .stdout(predicate::str::contains("m_size"))
        .stdout(predicate::str::contains("main").not());
}

#[test]
fn test_query_file_ordered_by_line() {
    let tmp = setup_imported_db();
    let output = tagdb(&tmp)
        .args(["query", "file", "src/widget.h"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let names: Vec<&str> = stdout
        .lines()
        .filter_map(|l| l.split('\t').next())
        .collect();
    assert_eq!(names, vec!["Widget", "draw", "m_size"]);
}

#[test]
fn test_query_scope_with_kind() {
    let tmp = setup_imported_db();
    tagdb(&tmp)
        .args(["query", "scope", "ui::Widget", "--kind", "member"])
        .assert()
        .success()
        .stdout(predicate::str::contains("m_size"))
        .stdout(predicate::str::contains("draw").not());
}

#[test]
fn test_query_global_scope() {
    let tmp = setup_imported_db();
    tagdb(&tmp)
        .args(["query", "scope", "<global>", "--name", "ma"])
        .assert()
        .success()
        .stdout(predicate::str::contains("main"));
}

#[test]
fn test_query_at_line() {
    let tmp = setup_imported_db();
    tagdb(&tmp)
        .args(["query", "at", "src/widget.h", "8"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("draw\t"));
}

#[test]
fn test_query_resolve_json() {
    let tmp = setup_imported_db();
    tagdb(&tmp)
        .args(["--format", "json", "query", "resolve", "Widget", "--scope", "app"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"scope\": \"ui\""));
}

#[test]
fn test_query_resolve_unknown_fails() {
    let tmp = setup_imported_db();
    tagdb(&tmp)
        .args(["query", "resolve", "Gadget"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot resolve"));
}

#[test]
fn test_search_limit_from_env() {
    let tmp = setup_imported_db();
    let output = tagdb(&tmp)
        .env("TAGDB_SEARCH_LIMIT", "1")
        .args(["query", "file", "src/widget.h"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).lines().count(), 1);
}

// ============================================================================
// Files, Remove, Clear
// ============================================================================

#[test]
fn test_files_listing_and_completion() {
    let tmp = setup_imported_db();
    tagdb(&tmp)
        .args(["files"])
        .assert()
        .success()
        .stdout(predicate::str::contains("src/main.cpp"))
        .stdout(predicate::str::contains("src/widget.h"));

    tagdb(&tmp)
        .args(["files", "wid"])
        .assert()
        .success()
        .stdout(predicate::str::contains("src/widget.h"))
        .stdout(predicate::str::contains("main").not());

    tagdb(&tmp)
        .args(["files", "--complete", "src/wi"])
        .assert()
        .success()
        .stdout("src/widget.h\n");
}

#[test]
fn test_remove_file() {
    let tmp = setup_imported_db();
    tagdb(&tmp)
        .args(["remove", "src/widget.h"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 3 tag(s)"));

    tagdb(&tmp)
        .args(["query", "name", "draw"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_clear() {
    let tmp = setup_imported_db();
    tagdb(&tmp).arg("clear").assert().success();
    tagdb(&tmp)
        .args(["--format", "json", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"tags\": 0"));
}

#[test]
fn test_explicit_db_and_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("sample.tags.json"), SAMPLE_TAGS).unwrap();
    fs::write(
        tmp.path().join("tagdb.yaml"),
        "database: custom.db\nsearch_limit: 2\n",
    )
    .unwrap();

    tagdb(&tmp)
        .args(["--config", "tagdb.yaml", "import", "sample.tags.json"])
        .assert()
        .success();
    assert!(tmp.path().join("custom.db").exists());
    assert!(!tmp.path().join("tags.db").exists());

    tagdb(&tmp)
        .args(["--db", "custom.db", "--format", "json", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"tags\": 4"));
}

#[test]
fn test_invalid_config_fails() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("bad.yaml"), "search_limit: [1, 2]\n").unwrap();
    tagdb(&tmp)
        .args(["--config", "bad.yaml", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid config file"));
}
