//! # wpbk-cli — Backup Kit Command-Line Interface
//!
//! Thin front end over the library crates, for operators and for
//! orchestrators that shell out instead of linking.
//!
//! ## Subcommands
//!
//! - `archive` — stream site files into a zip under a time budget
//! - `sql export` / `sql import` — rewrite table prefixes in a dump
//! - `sql map` — print the identifier map a rewrite would use
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from the handlers.
//! - Handlers delegate to `wpbk-archive` and `wpbk-sql`; no domain logic
//!   lives here.
//! - Machine-readable output goes to stdout; logs go to stderr.

pub mod archive;
pub mod sql;
