//! pamstack
//!
//! The command-line interface for reconciling PAM stack files.

mod cli;
mod commands;
mod error;

use std::io;

use clap::{CommandFactory, Parser};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = || commands::load_config(cli.config.as_deref());
    match cli.command {
        Commands::List {
            target,
            service,
            json,
        } => commands::run_list(&config()?, target.as_deref(), service.as_deref(), json),
        Commands::Apply {
            manifest,
            dry_run,
            json,
        } => commands::run_apply(&config()?, &manifest, dry_run, json),
        Commands::Check { manifest, json } => commands::run_check(&config()?, &manifest, json),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "pamstack", &mut io::stdout());
            Ok(())
        }
    }
}

/// Log to stderr, filtered by `RUST_LOG`; `--verbose` raises the default
/// from warnings to debug output.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(verbose)
        .try_init();
    tracing::debug!("Verbose mode enabled");
}
