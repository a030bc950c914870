//! `tagdb clear` command - Empty the database

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::open_store;
use crate::cli::GlobalOpts;

pub fn run(global: &GlobalOpts) -> Result<()> {
    let mut store = open_store(global)?;
    store.clear().into_diagnostic()?;
    println!("{} Tags database cleared", style("✓").green());
    Ok(())
}
