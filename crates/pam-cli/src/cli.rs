//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// pamstack - Reconcile PAM stack files with declared entries
#[derive(Parser, Debug)]
#[command(name = "pamstack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file naming the PAM locations (TOML, JSON or YAML)
    #[arg(short, long, global = true, env = "PAMSTACK_CONFIG")]
    pub config: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// List the entries of a stack file
    ///
    /// Examples:
    ///   pamstack list                      # The default target
    ///   pamstack list --service sshd       # /etc/pam.d/sshd
    ///   pamstack list --target /etc/pam.conf --json
    List {
        /// Stack file to read
        #[arg(short, long, conflicts_with = "service")]
        target: Option<PathBuf>,

        /// Service whose stack file to read
        #[arg(short, long)]
        service: Option<String>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Reconcile stack files with a manifest
    Apply {
        /// Manifest of [[entry]] declarations
        manifest: PathBuf,

        /// Preview changes without applying them
        #[arg(long)]
        dry_run: bool,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Report drift between stack files and a manifest
    Check {
        /// Manifest of [[entry]] declarations
        manifest: PathBuf,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
