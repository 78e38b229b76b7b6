//! File streaming body module
//!
//! Storage reads are blocking, so a background task on the blocking pool pumps fixed-size
//! chunks into a small bounded channel and the response body drains it. When the client goes
//! away hyper drops the body, the pump's next send fails and the reader is dropped with it.

use crate::storage::{EntryReader, FileEntry};
use hyper::body::{Body, Bytes, Frame, SizeHint};
use std::io::{self, ErrorKind, Read};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// Bytes read from storage per chunk
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Chunks buffered between the reader and the connection
const CHANNEL_CAPACITY: usize = 4;

/// Lazy, single-use response body over a file entry
#[derive(Debug)]
pub struct FileBody {
    rx: mpsc::Receiver<io::Result<Bytes>>,
    remaining: u64,
}

impl FileBody {
    /// Open `entry` and skip `skip` bytes. Blocking; run it off the async workers.
    pub fn open_reader(entry: &dyn FileEntry, skip: u64) -> io::Result<Box<dyn EntryReader>> {
        let mut reader = entry.open()?;
        if skip > 0 {
            reader.skip_forward(skip)?;
        }
        Ok(reader)
    }

    /// Stream at most `length` bytes from `reader`.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(reader: Box<dyn EntryReader>, length: u64) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        if length > 0 {
            tokio::task::spawn_blocking(move || pump(reader, length, &tx));
        }
        Self {
            rx,
            remaining: length,
        }
    }

    /// Bytes not yet delivered
    pub const fn remaining(&self) -> u64 {
        self.remaining
    }
}

/// Copy up to `length` bytes from `reader` into `tx`, chunk by chunk
fn pump(mut reader: Box<dyn EntryReader>, length: u64, tx: &mpsc::Sender<io::Result<Bytes>>) {
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut remaining = length;

    while remaining > 0 {
        let want = usize::try_from(remaining).map_or(CHUNK_SIZE, |r| r.min(CHUNK_SIZE));
        match reader.read(&mut buf[..want]) {
            Ok(0) => {
                let _ = tx.blocking_send(Err(io::Error::new(
                    ErrorKind::UnexpectedEof,
                    format!("file ended {remaining} bytes early"),
                )));
                return;
            }
            Ok(n) => {
                remaining -= n as u64;
                if tx
                    .blocking_send(Ok(Bytes::copy_from_slice(&buf[..n])))
                    .is_err()
                {
                    tracing::debug!(remaining, "Client went away, closing file stream");
                    return;
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => {
                let _ = tx.blocking_send(Err(e));
                return;
            }
        }
    }
}

impl Body for FileBody {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        if self.remaining == 0 {
            return Poll::Ready(None);
        }
        match self.rx.poll_recv(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                self.remaining = self.remaining.saturating_sub(chunk.len() as u64);
                Poll::Ready(Some(Ok(Frame::data(chunk))))
            }
            Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(e))),
            Poll::Ready(None) => Poll::Ready(Some(Err(io::Error::new(
                ErrorKind::BrokenPipe,
                "file stream closed early",
            )))),
            Poll::Pending => Poll::Pending,
        }
    }

    fn is_end_stream(&self) -> bool {
        self.remaining == 0
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::with_exact(self.remaining)
    }
}
