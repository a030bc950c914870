//! `tagdb completions` command
//!
//! Emits a completion script built from the clap command tree, so the
//! `query` subcommands, `--format` values and `--order-by` columns
//! complete without a hand-maintained list.
//!
//! ```bash
//! source <(tagdb completions bash)
//! tagdb completions zsh > "${fpath[1]}/_tagdb"
//! ```

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use miette::Result;
use std::io;

use crate::cli::Cli;

#[derive(clap::Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Write the script for `args.shell` to stdout
pub fn run(args: CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(args.shell, &mut cmd, bin_name, &mut io::stdout());
    Ok(())
}
