//! # Archive Subcommand
//!
//! Streams site files into a zip archive and prints the run result as JSON.
//!
//! ```bash
//! # Archive two files, giving up after 25 seconds:
//! wpbk archive --root /var/www/html --output part-1.zip --time-budget 25 \
//!     wp-config.php wp-content/uploads/logo.png
//!
//! # Take the file list from a file, one path per line:
//! wpbk archive --root /var/www/html --files-from files.txt --output part-1.zip
//! ```
//!
//! Exit code 2 means the run stopped early; the `files_added` and
//! `files_skipped` lists say where to resume.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use wpbk_archive::{ArchiveRequest, ArchiveTask};
use wpbk_core::{BackupConfig, Compression};

/// Exit code for a run that stopped before the end of the file list.
pub const EXIT_TRUNCATED: u8 = 2;

/// Arguments for the archive subcommand.
#[derive(Args, Debug)]
pub struct ArchiveArgs {
    /// Site root that file paths are relative to. Overrides `root_path`.
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Read the file list from FILE, one path per line.
    #[arg(long, value_name = "FILE", conflicts_with = "files")]
    pub files_from: Option<PathBuf>,

    /// Relative paths to archive, in order.
    pub files: Vec<String>,

    /// Zip file to create.
    #[arg(long, short)]
    pub output: PathBuf,

    /// Paths are base64-wrapped.
    #[arg(long)]
    pub encoded: bool,

    /// Soft time budget in seconds. Overrides `time_budget_seconds`.
    #[arg(long, value_name = "SECS")]
    pub time_budget: Option<f64>,

    /// Store entries without compression.
    #[arg(long)]
    pub stored: bool,
}

/// Execute the archive subcommand.
pub fn run_archive(args: &ArchiveArgs, config: &BackupConfig) -> Result<u8> {
    let request = build_request(args, config)?;
    let compression = if args.stored {
        Compression::Stored
    } else {
        config.compression
    };

    tracing::debug!(output = %args.output.display(), ?compression, "opening archive output");

    let file = File::create(&args.output)
        .with_context(|| format!("failed to create archive: {}", args.output.display()))?;
    let outcome = ArchiveTask::new()
        .with_compression(compression)
        .run(&request, BufWriter::new(file));

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            discard_partial(&args.output);
            return Err(e)
                .with_context(|| format!("archive run failed: {}", args.output.display()));
        }
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&result).context("failed to serialize archive result")?
    );

    if result.truncated {
        tracing::warn!(
            remaining = result.remaining(&request).len(),
            "archive run stopped early; resume with the remaining files"
        );
        Ok(EXIT_TRUNCATED)
    } else {
        Ok(0)
    }
}

/// Merge flags over the configuration file into a request.
fn build_request(args: &ArchiveArgs, config: &BackupConfig) -> Result<ArchiveRequest> {
    let root = args
        .root
        .clone()
        .or_else(|| config.root_path.clone())
        .context("no site root: pass --root or set root_path in the config file")?;

    let files = match &args.files_from {
        Some(path) => read_file_list(path)?,
        None => args.files.clone(),
    };

    let budget = args.time_budget.unwrap_or(config.time_budget_seconds);
    if !budget.is_finite() || budget < 0.0 {
        anyhow::bail!("--time-budget must be a non-negative number, got {budget}");
    }

    Ok(ArchiveRequest::new(root, files)
        .encoded(args.encoded || config.encoded_paths)
        .with_time_budget(budget))
}

/// One path per line. Blank lines are ignored; paths are otherwise kept
/// as written, spaces included.
fn read_file_list(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read file list: {}", path.display()))?;
    Ok(content
        .lines()
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn discard_partial(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        tracing::warn!(path = %path.display(), error = %e, "could not remove partial archive");
    }
}
