//! # Codec Errors

use std::path::PathBuf;

use thiserror::Error;
use wpbk_core::ValidationError;

/// Failure reported by a [`TableCatalog`](crate::TableCatalog).
#[derive(Error, Debug)]
pub enum CatalogError {
    /// A table list file could not be read.
    #[error("cannot read table list {}: {source}", path.display())]
    Read {
        /// Path of the table list.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The backing store rejected the table listing query.
    #[error("table listing failed: {0}")]
    Query(String),
}

/// Failure while building or applying identifier rewrites.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The live table catalog could not be listed.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// A prefix handed to the codec is invalid.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A statement matcher could not be compiled.
    #[error("cannot build matcher for identifier {identifier:?}: {source}")]
    Pattern {
        /// Identifier the matcher was built for.
        identifier: String,
        /// Underlying regex failure.
        #[source]
        source: regex::Error,
    },

    /// Reading or writing a dump stream failed.
    #[error("dump I/O error: {0}")]
    Io(#[from] std::io::Error),
}
