//! `tagdb status` command - Database statistics

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::open_store;
use crate::cli::output::print_json;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::TAGS_DB_VERSION;

pub fn run(global: &GlobalOpts) -> Result<()> {
    let store = open_store(global)?;
    let stats = store.statistics().into_diagnostic()?;

    if global.format == OutputFormat::Json {
        return print_json(&stats);
    }

    let location = store
        .path()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    let version = stats.version.as_deref().unwrap_or("unknown");

    println!("{}", style("Tags Database").bold());
    println!("{}", style("─".repeat(40)).dim());
    println!("  Location:      {}", location);
    if version == TAGS_DB_VERSION {
        println!("  Version:       {}", version);
    } else {
        println!("  Version:       {}", style(version).yellow());
    }
    println!("  Tags:          {}", style(stats.tags).cyan());
    println!("  Global tags:   {}", style(stats.global_tags).cyan());
    println!("  Files:         {}", style(stats.files).cyan());
    println!("  Macros:        {}", style(stats.macros).cyan());
    println!("  Simple macros: {}", style(stats.simple_macros).cyan());
    println!(
        "  Database size: {} KB",
        style(stats.db_size_bytes / 1024).cyan()
    );

    Ok(())
}
