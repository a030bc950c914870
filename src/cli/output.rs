//! Output rendering for query results
//!
//! `auto` renders a table on a terminal and tab-separated rows when piped,
//! so results stay greppable.

use console::{style, Term};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::truncate_str;
use crate::cli::OutputFormat;
use crate::core::{FileEntry, TagEntry};

const TAG_HEADER: [&str; 5] = ["NAME", "KIND", "SCOPE", "FILE", "LINE"];

/// Resolve `auto` against the current stdout
fn effective(format: OutputFormat) -> OutputFormat {
    match format {
        OutputFormat::Auto if Term::stdout().is_term() => OutputFormat::Auto,
        OutputFormat::Auto => OutputFormat::Tsv,
        other => other,
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    Ok(())
}

/// Render rows as a table (terminal or markdown) or as TSV
fn print_rows(format: OutputFormat, header: &[&str], rows: Vec<Vec<String>>) {
    match effective(format) {
        OutputFormat::Tsv | OutputFormat::Json => {
            for row in rows {
                println!("{}", row.join("\t"));
            }
        }
        OutputFormat::Md => {
            let mut builder = Builder::default();
            builder.push_record(header.iter().copied());
            for row in rows {
                builder.push_record(row);
            }
            println!("{}", builder.build().with(Style::markdown()));
        }
        OutputFormat::Auto => {
            let count = rows.len();
            let mut builder = Builder::default();
            builder.push_record(header.iter().copied());
            for row in rows {
                builder.push_record(row);
            }
            println!("{}", builder.build().with(Style::rounded()));
            println!("{}", style(format!("{} result(s)", count)).dim());
        }
    }
}

pub fn print_tags(tags: &[TagEntry], format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(tags);
    }

    let table = effective(format) == OutputFormat::Auto;
    let rows = tags
        .iter()
        .map(|tag| {
            vec![
                tag.name.clone(),
                tag.kind.clone(),
                if table {
                    truncate_str(&tag.scope, 40)
                } else {
                    tag.scope.clone()
                },
                tag.file.clone(),
                tag.line.to_string(),
            ]
        })
        .collect();
    print_rows(format, &TAG_HEADER, rows);
    Ok(())
}

pub fn print_files(files: &[FileEntry], format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(files);
    }

    let rows = files
        .iter()
        .map(|entry| {
            vec![
                entry.file.clone(),
                entry
                    .last_retagged_at()
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string(),
            ]
        })
        .collect();
    print_rows(format, &["FILE", "LAST RETAGGED"], rows);
    Ok(())
}

/// One value per line, for completion candidates and similar
pub fn print_lines(lines: &[String], format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(lines);
    }
    for line in lines {
        println!("{}", line);
    }
    Ok(())
}
