//! cdxj-indexer - CLI entry point

mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cdxj_indexer::cli::{normalize_args, Cli, Commands};

/// Environment variable holding a tracing filter directive.
const LOG_ENV: &str = "CDXJ_INDEXER_LOG";

/// Log to stderr so stdout stays a clean index stream.
fn init_tracing(verbose: bool) {
    let filter = std::env::var(LOG_ENV).unwrap_or_else(|_| {
        if verbose {
            "cdxj_indexer=debug".to_string()
        } else {
            "cdxj_indexer=warn".to_string()
        }
    });
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(EnvFilter::new(filter))
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Index(args) => commands::index::handle(&args),
        Commands::Completions { shell } => commands::completions::handle::<Cli>(shell),
    }
}
