//! # wpbk-sql — Identifier Rewrite Codec
//!
//! Makes SQL dumps portable across installations with different table
//! prefixes. On export every live table name (`wp_posts`) is rewritten to a
//! placeholder-prefixed form (`LIVE_posts`); on import the placeholder is
//! mapped back to the target installation's prefix.
//!
//! ```
//! use wpbk_core::TablePrefix;
//! use wpbk_sql::{Direction, DumpRewriter, IdentifierCodec, StaticCatalog};
//!
//! let catalog = StaticCatalog::new(["wp_posts"]);
//! let codec = IdentifierCodec::new(
//!     catalog,
//!     TablePrefix::new("wp_")?,
//!     TablePrefix::new("LIVE_")?,
//! )?;
//! let rewriter = DumpRewriter::from_codec(&codec, Direction::Export)?;
//! let line = rewriter.rewrite_line(b"INSERT INTO `wp_posts` VALUES (1);");
//! assert_eq!(line.as_ref(), b"INSERT INTO `LIVE_posts` VALUES (1);");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Crate Policy
//!
//! - Table discovery goes through [`TableCatalog`]; no database driver is
//!   linked here.
//! - Only the four statement shapes the exporter writes are rewritten.
//!   Everything else passes through unchanged.
//! - Dumps are processed as bytes; row data need not be UTF-8.

pub mod catalog;
pub mod codec;
pub mod error;
pub mod map;
pub mod rewrite;

pub use catalog::{
    ListTablesQuery, StaticCatalog, TableCatalog, CORE_TABLES, GLOBAL_TABLES, MS_GLOBAL_TABLES,
    OLD_TABLES,
};
pub use codec::{build_matcher, build_replacement, Direction, IdentifierCodec, RewriteRule};
pub use error::{CatalogError, CodecError};
pub use map::IdentifierMap;
pub use rewrite::{DumpRewriter, RewriteStats};
