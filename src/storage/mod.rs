//! Storage abstraction module
//!
//! The server only sees the served volume through [`FileEntry`]: a node in a file hierarchy
//! that can be searched and opened for sequential reading. Two drivers are provided:
//! - [`LocalEntry`] for a volume mounted on the host filesystem
//! - [`MemoryEntry`] for an in-memory tree

mod local;
mod memory;

pub use local::LocalEntry;
pub use memory::MemoryEntry;

use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};
use std::sync::Arc;

/// Chunk size used when a forward skip has to read and discard
const DISCARD_CHUNK: u64 = 64 * 1024;

/// A file or directory on the served volume
pub trait FileEntry: Send + Sync + fmt::Debug {
    fn is_directory(&self) -> bool;

    /// Entry name without any path component
    fn name(&self) -> &str;

    /// Length in bytes (0 for directories)
    fn length(&self) -> u64;

    /// Look up a descendant by a `/`-separated relative path.
    ///
    /// An empty path names the entry itself. Returns `Ok(None)` when nothing matches.
    fn search(&self, path: &str) -> io::Result<Option<Arc<dyn FileEntry>>>;

    /// Open a sequential reader positioned at the first byte
    fn open(&self) -> io::Result<Box<dyn EntryReader>>;
}

/// Sequential byte reader over a file entry
pub trait EntryReader: Read + Send {
    /// Advance `n` bytes without handing them to the caller.
    ///
    /// The default reads and discards; drivers backed by a seekable handle override it.
    /// Skipping past the end is not an error, later reads just return EOF.
    fn skip_forward(&mut self, n: u64) -> io::Result<()> {
        let mut remaining = n;
        while remaining > 0 {
            let step = remaining.min(DISCARD_CHUNK);
            let skipped = io::copy(&mut Read::take(&mut *self, step), &mut io::sink())?;
            if skipped == 0 {
                break;
            }
            remaining -= skipped;
        }
        Ok(())
    }
}

/// Reader that skips by seeking
#[derive(Debug)]
pub struct Seekable<R>(pub R);

impl<R: Read> Read for Seekable<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl<R: Read + Seek + Send> EntryReader for Seekable<R> {
    fn skip_forward(&mut self, n: u64) -> io::Result<()> {
        let offset = i64::try_from(n).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "skip offset out of range")
        })?;
        self.0.seek(SeekFrom::Current(offset))?;
        Ok(())
    }
}

/// Reader that can only move forward by reading
#[derive(Debug)]
pub struct Sequential<R>(pub R);

impl<R: Read> Read for Sequential<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl<R: Read + Send> EntryReader for Sequential<R> {}

/// Split a relative search path into its non-empty components
pub(crate) fn path_components(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|c| !c.is_empty() && *c != ".")
}
