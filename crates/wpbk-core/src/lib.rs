//! # wpbk-core — Foundational Types for the Backup Kit
//!
//! Leaf crate of the `wpbk` workspace. Every other crate depends on it;
//! it depends on nothing internal.
//!
//! ## Contents
//!
//! - **Errors.** The `ConfigError` and `ValidationError` families shared
//!   by the archive and SQL crates.
//! - **Configuration.** `BackupConfig`, loaded from YAML and overridden by
//!   CLI flags.
//! - **Table prefixes.** `TablePrefix`, a validated newtype for the
//!   installation base prefix and the portable intermediate prefix.
//! - **Encoded paths.** `decode_if_plausible()`, the reversible path
//!   encoding used by orchestrators that ship file lists through form
//!   fields and query strings.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `wpbk-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod config;
pub mod encoding;
pub mod error;
pub mod prefix;

pub use config::{BackupConfig, Compression};
pub use encoding::{decode_if_plausible, encode_path};
pub use error::{ConfigError, ValidationError};
pub use prefix::TablePrefix;
