//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs, files::FilesArgs, import::ImportArgs, query::QueryCommands,
    remove::RemoveArgs,
};

#[derive(Parser)]
#[command(name = "tagdb")]
#[command(author, version, about = "Persistent symbol tags store")]
#[command(long_about = "Index source-code symbols (functions, classes, variables, macros) into a \
    SQLite tags database and query them for navigation, completion and type resolution.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Enable verbose (debug) logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Tags database (default: from config, else ./tags.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Extra config file layered over the user config
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import tag batches from JSON files or directories
    Import(ImportArgs),

    /// Query the tags database
    #[command(subcommand)]
    Query(QueryCommands),

    /// List indexed files
    Files(FilesArgs),

    /// Remove every tag of the given files
    Remove(RemoveArgs),

    /// Show database statistics
    Status,

    /// Remove all tags, files and macros
    Clear,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Table on a terminal, tsv when piped
    #[default]
    Auto,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// Markdown tables
    Md,
}
