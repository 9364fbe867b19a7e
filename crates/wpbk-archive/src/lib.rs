//! # wpbk-archive — Archive Streaming Task
//!
//! Streams a caller-supplied list of site files into a zip container,
//! writing straight through to the output sink, and records which files
//! made it in. Runs until the list is exhausted or a cooperative stop
//! condition (time budget or external signal) fires between files; the
//! result then says where to resume.
//!
//! ```no_run
//! use std::fs::File;
//! use wpbk_archive::{ArchiveRequest, ArchiveTask};
//!
//! let request = ArchiveRequest::new("/var/www/html", vec!["wp-config.php".into()])
//!     .with_time_budget(25.0);
//! let out = File::create("backup.zip")?;
//! let result = ArchiveTask::new().run(&request, out)?;
//! if result.truncated {
//!     println!("resume with {:?}", result.remaining(&request));
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Archive layout
//!
//! - One entry per added file, named by its relative path.
//! - `manifest-skip.txt` when at least one file was skipped.
//! - `manifest.txt`, always, listing the added files.
//!
//! ## Crate Policy
//!
//! - Missing or unreadable files are skipped and logged, never fatal.
//! - Root, sink, and container failures are fatal; partial output is
//!   invalid.
//! - No `..` canonicalization: the caller vets the file list.

pub mod budget;
pub mod error;
pub mod manifest;
pub mod request;
pub mod task;

pub use budget::{Clock, NeverStop, StopFlag, StopSignal, SystemClock, TimeBudget};
pub use error::ArchiveError;
pub use manifest::{render_manifest, MANIFEST_ENTRY, MANIFEST_SKIP_ENTRY};
pub use request::{ArchiveRequest, ArchiveResult};
pub use task::ArchiveTask;
