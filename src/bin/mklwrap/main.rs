//! mklwrap CLI - generate precision-dispatching wrappers for MKL style routines

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("mklwrap=debug")
    } else {
        EnvFilter::new("mklwrap=info")
    };

    // Generated code may go to stdout, so logs always go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        Commands::Generate(args) => commands::generate::execute(args),
        Commands::Inspect(args) => commands::inspect::execute(args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
