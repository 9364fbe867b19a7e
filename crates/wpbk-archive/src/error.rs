//! # Archive Errors
//!
//! Only fatal conditions are errors. A missing or unreadable requested
//! file is recorded in the result's skip list and never surfaces here.
//!
//! Any error returned after the first entry was written leaves the sink
//! holding an incomplete container. Callers must discard it.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal failure of an archive run.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The root directory does not exist or is not a directory.
    #[error("archive root is not a directory: {}", path.display())]
    RootNotFound {
        /// The root path as supplied by the caller.
        path: PathBuf,
    },

    /// Writing to the output sink failed.
    #[error("output sink write failed while writing entry {entry:?}: {source}")]
    Sink {
        /// Entry being written when the sink failed.
        entry: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The zip writer rejected an operation (entry header, finalization).
    #[error("zip container error at entry {entry:?}: {source}")]
    Zip {
        /// Entry being written when the container failed.
        entry: String,
        /// Underlying zip failure.
        #[source]
        source: zip::result::ZipError,
    },
}
