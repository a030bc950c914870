//! `tagdb files` command - List indexed files

use miette::Result;

use crate::cli::helpers::open_store;
use crate::cli::output::{print_files, print_lines};
use crate::cli::GlobalOpts;

#[derive(clap::Args, Debug)]
pub struct FilesArgs {
    /// File name prefix; ending it with `/` matches the full path instead
    pub partial: Option<String>,

    /// Print completion candidates for a typed path fragment
    #[arg(long, requires = "partial")]
    pub complete: bool,
}

pub fn run(args: FilesArgs, global: &GlobalOpts) -> Result<()> {
    let mut store = open_store(global)?;

    match args.partial {
        Some(typed) if args.complete => {
            let candidates = store.files_for_completion(&typed);
            print_lines(&candidates, global.format)
        }
        Some(partial) => print_files(&store.files_matching(&partial), global.format),
        None => print_files(&store.files(), global.format),
    }
}
