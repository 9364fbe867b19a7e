//! # SQL Subcommand
//!
//! Rewrites table prefixes in SQL dumps and shows the identifier map behind
//! a rewrite. The live table list comes from a file, one name per line,
//! typically captured with `SHOW TABLES` next to the dump.
//!
//! ```bash
//! # Make a dump portable:
//! wpbk sql export --tables tables.txt --intermediate-prefix LIVE_ \
//!     --input site.sql --output portable.sql
//!
//! # Replay it under another installation's prefix:
//! wpbk sql import --tables target-tables.txt --base-prefix site2_ \
//!     --intermediate-prefix LIVE_ --input portable.sql --output site2.sql
//!
//! # Inspect the map:
//! wpbk sql map --tables tables.txt --intermediate-prefix LIVE_
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use wpbk_core::{BackupConfig, TablePrefix};
use wpbk_sql::{Direction, DumpRewriter, IdentifierCodec, StaticCatalog};

/// SQL subcommand arguments.
#[derive(Args, Debug)]
pub struct SqlArgs {
    #[command(subcommand)]
    pub command: SqlCommand,
}

/// Available SQL subcommands.
#[derive(Subcommand, Debug)]
pub enum SqlCommand {
    /// Rewrite live table names into portable placeholder names.
    Export(RewriteArgs),

    /// Rewrite portable placeholder names into live table names.
    Import(RewriteArgs),

    /// Print the identifier map as JSON.
    Map(CodecArgs),
}

/// Options that determine the identifier map.
#[derive(Args, Debug)]
pub struct CodecArgs {
    /// Live table list, one name per line.
    #[arg(long, value_name = "FILE")]
    pub tables: PathBuf,

    /// Installation table prefix. Overrides `base_prefix`.
    #[arg(long)]
    pub base_prefix: Option<String>,

    /// Portable placeholder prefix. Overrides `intermediate_prefix`.
    #[arg(long)]
    pub intermediate_prefix: Option<String>,
}

/// Options for a dump rewrite.
#[derive(Args, Debug)]
pub struct RewriteArgs {
    #[command(flatten)]
    pub codec: CodecArgs,

    /// Dump to read.
    #[arg(long)]
    pub input: PathBuf,

    /// Dump to write.
    #[arg(long, short)]
    pub output: PathBuf,
}

/// Execute the SQL subcommand.
pub fn run_sql(args: &SqlArgs, config: &BackupConfig) -> Result<u8> {
    match &args.command {
        SqlCommand::Export(rewrite) => run_rewrite(rewrite, Direction::Export, config),
        SqlCommand::Import(rewrite) => run_rewrite(rewrite, Direction::Import, config),
        SqlCommand::Map(codec) => run_map(codec, config),
    }
}

fn run_map(args: &CodecArgs, config: &BackupConfig) -> Result<u8> {
    let codec = build_codec(args, config)?;
    let map = codec.get_replacements()?;
    println!(
        "{}",
        serde_json::to_string_pretty(map).context("failed to serialize identifier map")?
    );
    Ok(0)
}

fn run_rewrite(args: &RewriteArgs, direction: Direction, config: &BackupConfig) -> Result<u8> {
    let codec = build_codec(&args.codec, config)?;
    if codec.intermediate_prefix().is_empty() {
        tracing::warn!("no intermediate prefix configured; the dump is copied unchanged");
    }
    let rewriter = DumpRewriter::from_codec(&codec, direction)?;

    let input = File::open(&args.input)
        .with_context(|| format!("failed to open dump: {}", args.input.display()))?;
    let output = File::create(&args.output)
        .with_context(|| format!("failed to create dump: {}", args.output.display()))?;

    let stats = match rewriter.rewrite(BufReader::new(input), BufWriter::new(output)) {
        Ok(stats) => stats,
        Err(e) => {
            discard_partial(&args.output);
            return Err(e).with_context(|| {
                format!(
                    "failed to rewrite {} into {}",
                    args.input.display(),
                    args.output.display()
                )
            });
        }
    };

    println!("OK: rewrote {} of {} lines", stats.rewritten, stats.lines);
    Ok(0)
}

/// Resolve prefixes (flags over config) and load the table list.
fn build_codec(args: &CodecArgs, config: &BackupConfig) -> Result<IdentifierCodec<StaticCatalog>> {
    let (base, intermediate) = resolve_prefixes(args, config)?;
    let catalog = StaticCatalog::from_file(&args.tables)?;
    tracing::debug!(
        tables = catalog.tables().len(),
        base_prefix = %base,
        intermediate_prefix = %intermediate,
        "loaded table list"
    );
    Ok(IdentifierCodec::new(catalog, base, intermediate)?)
}

fn resolve_prefixes(args: &CodecArgs, config: &BackupConfig) -> Result<(TablePrefix, TablePrefix)> {
    let base = match args.base_prefix.as_deref() {
        Some(p) => TablePrefix::base(p).with_context(|| format!("invalid --base-prefix {p:?}"))?,
        None => config.base_prefix.clone(),
    };
    let intermediate = match args.intermediate_prefix.as_deref() {
        Some(p) => TablePrefix::new(p)
            .with_context(|| format!("invalid --intermediate-prefix {p:?}"))?,
        None => config.intermediate_prefix.clone(),
    };
    if !intermediate.is_empty() && intermediate == base {
        anyhow::bail!(
            "intermediate prefix {:?} must differ from the base prefix",
            intermediate.as_str()
        );
    }
    Ok((base, intermediate))
}

fn discard_partial(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        tracing::warn!(path = %path.display(), error = %e, "could not remove partial dump");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec_args(tables: &Path, base: Option<&str>, intermediate: Option<&str>) -> CodecArgs {
        CodecArgs {
            tables: tables.to_path_buf(),
            base_prefix: base.map(str::to_string),
            intermediate_prefix: intermediate.map(str::to_string),
        }
    }

    #[test]
    fn export_and_import_round_trip_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let tables = dir.path().join("tables.txt");
        std::fs::write(&tables, "wp_posts\nwp_options\n").unwrap();
        let dump = "DROP TABLE IF EXISTS `wp_posts`;\nINSERT INTO `wp_posts` VALUES (1);\nSELECT 1;\n";
        let original = dir.path().join("site.sql");
        std::fs::write(&original, dump).unwrap();

        let portable = dir.path().join("portable.sql");
        let export = SqlArgs {
            command: SqlCommand::Export(RewriteArgs {
                codec: codec_args(&tables, None, Some("LIVE_")),
                input: original.clone(),
                output: portable.clone(),
            }),
        };
        assert_eq!(run_sql(&export, &BackupConfig::default()).unwrap(), 0);
        let text = std::fs::read_to_string(&portable).unwrap();
        assert!(text.contains("`LIVE_posts`"));
        assert!(!text.contains("`wp_posts`"));

        let restored = dir.path().join("restored.sql");
        let import = SqlArgs {
            command: SqlCommand::Import(RewriteArgs {
                codec: codec_args(&tables, None, Some("LIVE_")),
                input: portable,
                output: restored.clone(),
            }),
        };
        assert_eq!(run_sql(&import, &BackupConfig::default()).unwrap(), 0);
        assert_eq!(std::fs::read_to_string(&restored).unwrap(), dump);
    }

    #[test]
    fn flags_override_config_prefixes() {
        let config = BackupConfig {
            intermediate_prefix: TablePrefix::new("PORT_").unwrap(),
            ..BackupConfig::default()
        };
        let args = codec_args(Path::new("tables.txt"), Some("site2_"), None);
        let (base, intermediate) = resolve_prefixes(&args, &config).unwrap();
        assert_eq!(base, "site2_");
        assert_eq!(intermediate, "PORT_");
    }

    #[test]
    fn invalid_prefix_flag_is_rejected() {
        let args = codec_args(Path::new("tables.txt"), Some("wp_'; DROP"), None);
        let err = resolve_prefixes(&args, &BackupConfig::default()).unwrap_err();
        assert!(err.to_string().contains("--base-prefix"));
    }

    #[test]
    fn equal_prefixes_are_rejected() {
        let args = codec_args(Path::new("tables.txt"), None, Some("wp_"));
        assert!(resolve_prefixes(&args, &BackupConfig::default()).is_err());
    }

    #[test]
    fn missing_table_list_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let args = SqlArgs {
            command: SqlCommand::Map(codec_args(&dir.path().join("nope.txt"), None, None)),
        };
        let err = run_sql(&args, &BackupConfig::default()).unwrap_err();
        assert!(format!("{err:#}").contains("nope.txt"));
    }
}
