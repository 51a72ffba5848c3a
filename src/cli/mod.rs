//! Command-line interface.
//!
//! ```text
//! rulesmith build    [--target T]... [--dry-run] [--strict]
//! rulesmith check    [--target T]... [--all]
//! rulesmith validate [--target T]... [--strict] [--json]
//! rulesmith list     [--target T]... [--kind K] [--json]
//! ```
//!
//! Every command finds `rulesmith.toml` by walking up from the working
//! directory unless `--config` names one. Diagnostics go to stderr, results to
//! stdout. Logging is controlled by `--verbose`/`--quiet` or `RULESMITH_LOG`.

mod build;
mod check;
pub mod common;
mod list;
mod validate;

pub use build::BuildCommand;
pub use check::{CheckCommand, FileStatus, compare};
pub use list::{ListCommand, ListEntry};
pub use validate::ValidateCommand;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::constants::LOG_ENV_VAR;

#[derive(Parser, Debug)]
#[command(
    name = "rulesmith",
    about = "Compile rules, personas, commands and hooks for coding assistants",
    version,
    long_about = "rulesmith reads guidance documents from one or more source directories, \
                  resolves conditions, inheritance, includes and platform blocks, and writes \
                  the native configuration files of Claude Code, Cursor and OpenCode."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable logging
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Path to rulesmith.toml (default: search upwards from the current directory)
    #[arg(short, long, global = true, env = "RULESMITH_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate artifacts for the configured targets and write them
    Build(BuildCommand),

    /// Report generated files that are missing or differ from the disk
    Check(CheckCommand),

    /// Resolve every target and report diagnostics without writing
    Validate(ValidateCommand),

    /// List the resolved documents per target
    List(ListCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        init_logging(self.log_filter());

        let config = self.config.as_deref();
        match self.command {
            Commands::Build(cmd) => cmd.execute(config).await,
            Commands::Check(cmd) => cmd.execute(config).await,
            Commands::Validate(cmd) => cmd.execute(config).await,
            Commands::List(cmd) => cmd.execute(config).await,
        }
    }

    /// Filter directive for this invocation. `None` disables logging.
    #[must_use]
    pub fn log_filter(&self) -> Option<String> {
        if self.quiet {
            None
        } else if self.verbose {
            Some("rulesmith=debug".to_string())
        } else {
            Some(std::env::var(LOG_ENV_VAR).unwrap_or_else(|_| "rulesmith=warn".to_string()))
        }
    }
}

/// Install the global subscriber, writing to stderr. Safe to call twice.
fn init_logging(filter: Option<String>) {
    let Some(filter) = filter else {
        return;
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
