//! # wpbk CLI entry point
//!
//! Parses command-line arguments, loads the optional configuration file,
//! and dispatches to subcommand handlers.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use wpbk_cli::archive::{run_archive, ArchiveArgs};
use wpbk_cli::sql::{run_sql, SqlArgs};
use wpbk_core::BackupConfig;

/// Backup kit: resumable site archives and portable SQL dumps.
#[derive(Parser, Debug)]
#[command(name = "wpbk", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Stream site files into a zip archive under a time budget.
    Archive(ArchiveArgs),

    /// Rewrite table prefixes in SQL dumps.
    Sql(SqlArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    // stdout carries JSON results; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("wpbk CLI starting");

    match run(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<u8> {
    let config = load_config(cli.config.as_deref())?;
    match &cli.command {
        Commands::Archive(args) => run_archive(args, &config),
        Commands::Sql(args) => run_sql(args, &config),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<BackupConfig> {
    match path {
        Some(path) => BackupConfig::load(path)
            .with_context(|| format!("failed to load configuration: {}", path.display())),
        None => Ok(BackupConfig::default()),
    }
}
