use clap::Parser;
use miette::Result;
use tagdb::cli::{logging, Cli, Commands};

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    logging::init_logging(global.verbose);

    match cli.command {
        Commands::Import(args) => tagdb::cli::commands::import::run(args, &global),
        Commands::Query(cmd) => tagdb::cli::commands::query::run(cmd, &global),
        Commands::Files(args) => tagdb::cli::commands::files::run(args, &global),
        Commands::Remove(args) => tagdb::cli::commands::remove::run(args, &global),
        Commands::Status => tagdb::cli::commands::status::run(&global),
        Commands::Clear => tagdb::cli::commands::clear::run(&global),
        Commands::Completions(args) => tagdb::cli::commands::completions::run(args),
    }
}
