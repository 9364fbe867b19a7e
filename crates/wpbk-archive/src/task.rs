//! # Archive Streaming Task
//!
//! Streams requested files from a site root into a zip container written
//! straight to the caller's sink. Memory use is one copy buffer, never a
//! whole file.
//!
//! ## Per-file flow
//!
//! 1. Decode the path if the request says paths are encoded (best effort).
//! 2. Normalize to an entry name (leading separators stripped, `\\` as
//!    `/`) and resolve that same name under the root.
//! 3. Missing → skip. Unreadable or not a regular file → skip.
//! 4. Stream the bytes into an entry named after the relative path.
//! 5. Before the next file, poll the time budget and the stop signal.
//!
//! After the loop the skip manifest (if any) and the manifest are written
//! and the container is finalized.

use std::borrow::Cow;
use std::cell::Cell;
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, Read, Seek, Write};
use std::path::Path;
use std::rc::Rc;

use chrono::Utc;
use tracing::{debug, info, warn};
use wpbk_core::{decode_if_plausible, Compression};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::budget::{Clock, NeverStop, StopSignal, SystemClock};
use crate::error::ArchiveError;
use crate::manifest::{
    entry_name, is_reserved_entry, render_manifest, MANIFEST_ENTRY, MANIFEST_SKIP_ENTRY,
};
use crate::request::{ArchiveRequest, ArchiveResult};

/// Size of the buffer each file is streamed through.
pub const COPY_BUFFER_LEN: usize = 64 * 1024;

/// Zip entries at or above this size need the zip64 extension.
const ZIP64_THRESHOLD: u64 = u32::MAX as u64;

/// Why the run stopped before exhausting the file list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Halt {
    Budget,
    Signal,
}

/// A requested file after resolution.
enum Source {
    Missing,
    Unreadable(String),
    Ready { file: File, len: u64 },
}

/// Outcome of streaming one file into its entry.
enum Copied {
    Complete(u64),
    SourceFailed(io::Error),
}

/// Configured archive streaming task.
///
/// The clock and stop signal are type parameters so tests can drive the
/// budget deterministically; production code uses the defaults.
#[derive(Debug, Clone)]
pub struct ArchiveTask<C = SystemClock, S = NeverStop> {
    compression: Compression,
    clock: C,
    stop: S,
}

impl Default for ArchiveTask {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveTask {
    /// A task with Deflate entries, the system clock, and no stop signal.
    pub fn new() -> Self {
        Self {
            compression: Compression::Deflated,
            clock: SystemClock,
            stop: NeverStop,
        }
    }
}

impl<C, S> ArchiveTask<C, S> {
    /// Select how entries are compressed.
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Replace the clock used for budget checks.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> ArchiveTask<C2, S> {
        ArchiveTask {
            compression: self.compression,
            clock,
            stop: self.stop,
        }
    }

    /// Install a cooperative stop signal, polled between files.
    pub fn with_stop_signal<S2: StopSignal>(self, stop: S2) -> ArchiveTask<C, S2> {
        ArchiveTask {
            compression: self.compression,
            clock: self.clock,
            stop,
        }
    }
}

impl<C: Clock, S: StopSignal> ArchiveTask<C, S> {
    /// Stream the requested files into `sink`.
    ///
    /// # Errors
    ///
    /// Fails when the root is not a directory, or when writing to the sink
    /// or finalizing the container fails. Anything already written to
    /// the sink is then incomplete and must be discarded.
    pub fn run<W: Write + Seek>(
        &self,
        request: &ArchiveRequest,
        sink: W,
    ) -> Result<ArchiveResult, ArchiveError> {
        let root = request.root_path.as_path();
        if !root.is_dir() {
            return Err(ArchiveError::RootNotFound {
                path: root.to_path_buf(),
            });
        }

        let mut result = ArchiveResult {
            started_at: Utc::now(),
            ..Default::default()
        };

        let sink = FusedSink::new(sink);
        let blown = sink.fuse();
        let mut zip = ZipWriter::new(sink);
        if let Err(e) = self.fill(request, root, &mut zip, &mut result) {
            // The writer finalizes on drop; keep that away from the sink.
            blown.set(true);
            return Err(e);
        }

        let sink = zip.finish().map_err(|source| {
            blown.set(true);
            ArchiveError::Zip {
                entry: MANIFEST_ENTRY.to_string(),
                source,
            }
        })?;
        sink.into_inner()
            .flush()
            .map_err(|source| ArchiveError::Sink {
                entry: MANIFEST_ENTRY.to_string(),
                source,
            })?;

        result.finished_at = Utc::now();
        info!(
            added = result.files_added.len(),
            skipped = result.files_skipped.len(),
            truncated = result.truncated,
            "archive run finished"
        );
        Ok(result)
    }

    /// Add the requested files and the manifests to `zip`.
    fn fill<W: Write + Seek>(
        &self,
        request: &ArchiveRequest,
        root: &Path,
        zip: &mut ZipWriter<W>,
        result: &mut ArchiveResult,
    ) -> Result<(), ArchiveError> {
        let budget = request.time_budget();
        let started = self.clock.now();

        info!(
            root = %root.display(),
            files = request.files.len(),
            encoded = request.is_encoded,
            ?budget,
            "archive run starting"
        );

        let mut written: HashSet<String> = HashSet::new();
        let mut buf = vec![0u8; COPY_BUFFER_LEN];

        for (index, raw) in request.files.iter().enumerate() {
            if index > 0 {
                let halt = if budget.is_exceeded(self.clock.elapsed_since(started)) {
                    Some(Halt::Budget)
                } else if self.stop.should_stop() {
                    Some(Halt::Signal)
                } else {
                    None
                };
                if let Some(halt) = halt {
                    info!(
                        ?halt,
                        processed = index,
                        remaining = request.files.len() - index,
                        "archive run stopping early"
                    );
                    result.truncated = true;
                    break;
                }
            }

            let relative: Cow<'_, str> = if request.is_encoded {
                decode_if_plausible(raw)
            } else {
                Cow::Borrowed(raw.as_str())
            };
            // Entry name and on-disk path come from the same normalized form.
            let entry = entry_name(&relative);
            let resolved = root.join(&entry);

            if is_reserved_entry(&entry) || written.contains(&entry) {
                warn!(path = %relative, "entry name already used in archive; skipping");
                result.files_skipped.push(relative.into_owned());
                result.processed += 1;
                continue;
            }

            match open_source(&resolved) {
                Source::Missing => {
                    warn!(path = %relative, resolved = %resolved.display(), "file does not exist; skipping");
                    result.files_skipped.push(relative.into_owned());
                }
                Source::Unreadable(reason) => {
                    warn!(path = %relative, resolved = %resolved.display(), %reason, "file is not readable; skipping");
                    result.files_skipped.push(relative.into_owned());
                }
                Source::Ready { file, len } => {
                    match self.stream_source(zip, &entry, file, len, &mut buf)? {
                        Copied::Complete(bytes) => {
                            debug!(path = %relative, bytes, "added file");
                            written.insert(entry);
                            result.files_added.push(relative.into_owned());
                        }
                        Copied::SourceFailed(e) => {
                            warn!(path = %relative, error = %e, "read failed mid-file; entry discarded");
                            result.files_skipped.push(relative.into_owned());
                        }
                    }
                }
            }
            result.processed += 1;
        }

        if !result.files_skipped.is_empty() {
            let text = render_manifest(&result.files_skipped);
            self.write_text_entry(zip, MANIFEST_SKIP_ENTRY, &text)?;
        }
        let text = render_manifest(&result.files_added);
        self.write_text_entry(zip, MANIFEST_ENTRY, &text)
    }

    fn entry_options(&self, large: bool) -> SimpleFileOptions {
        let method = match self.compression {
            Compression::Stored => CompressionMethod::Stored,
            Compression::Deflated => CompressionMethod::Deflated,
        };
        SimpleFileOptions::default()
            .compression_method(method)
            .large_file(large)
    }

    /// Start `entry` and copy `source` into it through `buf`.
    ///
    /// A read failure aborts the entry, so nothing of it reaches the
    /// container, and is reported as [`Copied::SourceFailed`]. Write
    /// failures are fatal.
    fn stream_source<W: Write + Seek, R: Read>(
        &self,
        zip: &mut ZipWriter<W>,
        entry: &str,
        mut source: R,
        len: u64,
        buf: &mut [u8],
    ) -> Result<Copied, ArchiveError> {
        zip.start_file(entry, self.entry_options(len >= ZIP64_THRESHOLD))
            .map_err(|source| ArchiveError::Zip {
                entry: entry.to_string(),
                source,
            })?;
        let mut total = 0u64;
        loop {
            let n = match source.read(buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    zip.abort_file().map_err(|source| ArchiveError::Zip {
                        entry: entry.to_string(),
                        source,
                    })?;
                    return Ok(Copied::SourceFailed(e));
                }
            };
            zip.write_all(&buf[..n])
                .map_err(|source| ArchiveError::Sink {
                    entry: entry.to_string(),
                    source,
                })?;
            total += n as u64;
        }
        Ok(Copied::Complete(total))
    }

    fn write_text_entry<W: Write + Seek>(
        &self,
        zip: &mut ZipWriter<W>,
        name: &str,
        text: &str,
    ) -> Result<(), ArchiveError> {
        zip.start_file(name, self.entry_options(false))
            .map_err(|source| ArchiveError::Zip {
                entry: name.to_string(),
                source,
            })?;
        zip.write_all(text.as_bytes())
            .map_err(|source| ArchiveError::Sink {
                entry: name.to_string(),
                source,
            })
    }
}

/// Classify a resolved path as missing, unreadable, or ready to stream.
fn open_source(path: &Path) -> Source {
    let meta = match std::fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Source::Missing,
        Err(e) => return Source::Unreadable(e.to_string()),
    };
    if !meta.is_file() {
        return Source::Unreadable("not a regular file".into());
    }
    match File::open(path) {
        Ok(file) => Source::Ready {
            file,
            len: meta.len(),
        },
        Err(e) => Source::Unreadable(e.to_string()),
    }
}

// ---------------------------------------------------------------------------
// FusedSink
// ---------------------------------------------------------------------------

/// Output wrapper that goes inert once blown.
///
/// Blown by the first failed write or seek, or explicitly through
/// [`FusedSink::fuse`] when the run fails for another reason. After that
/// every operation succeeds without touching the inner sink, so the zip
/// writer's finalize-on-drop neither writes to a sink the caller must
/// discard nor reports a second failure.
struct FusedSink<W> {
    inner: W,
    blown: Rc<Cell<bool>>,
}

impl<W> FusedSink<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            blown: Rc::new(Cell::new(false)),
        }
    }

    /// Handle that blows this sink when set.
    fn fuse(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.blown)
    }

    fn into_inner(self) -> W {
        self.inner
    }

    fn guard<T>(&self, op: io::Result<T>) -> io::Result<T> {
        if op.is_err() {
            self.blown.set(true);
        }
        op
    }
}

impl<W: Write> Write for FusedSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.blown.get() {
            return Ok(buf.len());
        }
        let op = self.inner.write(buf);
        self.guard(op)
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.blown.get() {
            return Ok(());
        }
        let op = self.inner.flush();
        self.guard(op)
    }
}

impl<W: Seek> Seek for FusedSink<W> {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        if self.blown.get() {
            return Ok(0);
        }
        let op = self.inner.seek(pos);
        self.guard(op)
    }
}
