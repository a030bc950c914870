//! `tagdb remove` command - Drop the tags of source files

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::open_store;
use crate::cli::GlobalOpts;

#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    /// Source files as recorded in the database
    #[arg(required = true)]
    pub files: Vec<String>,
}

pub fn run(args: RemoveArgs, global: &GlobalOpts) -> Result<()> {
    let mut store = open_store(global)?;

    for file in &args.files {
        let removed = store.delete_by_file(file, true).into_diagnostic()?;
        if removed == 0 {
            println!("{} {} has no tags", style("!").yellow(), file);
        } else {
            println!(
                "{} Removed {} tag(s) of {}",
                style("✓").green(),
                removed,
                file
            );
        }
    }
    Ok(())
}
