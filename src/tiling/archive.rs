//! Streaming zip encoder.
//!
//! The archive is produced on a blocking thread by the `zip` crate's
//! non-seeking writer (local headers followed by data descriptors) and handed
//! to the HTTP body through a bounded channel. At most one entry's content and
//! a handful of chunks are in memory at any time.

use std::io::{self, Write};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;
use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Permission bits recorded for every entry.
pub const TILE_FILE_PERMISSIONS: u32 = 0o644;

/// Size at which buffered archive bytes are sent downstream.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Number of chunks that may wait in the channel.
const CHANNEL_CAPACITY: usize = 4;

/// One file to be stored in the archive.
#[derive(Debug, Clone)]
pub struct TileEntry {
    /// `/`-separated path inside the archive
    pub path: String,
    /// Modification time recorded in the headers
    pub modified: DateTime,
    /// Unix permission bits
    pub permissions: u32,
    /// File content
    pub content: Bytes,
}

impl TileEntry {
    /// Entry stamped with the current time and [`TILE_FILE_PERMISSIONS`].
    pub fn new(path: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            path: path.into(),
            modified: DateTime::default_for_write(),
            permissions: TILE_FILE_PERMISSIONS,
            content: content.into(),
        }
    }
}

/// Lazily produced zip archive bytes.
///
/// Yields an error, then ends, if an entry could not be produced after
/// streaming started. No bytes follow the error, so the consumer is left
/// with a truncated archive that has no central directory.
pub struct ZipStream {
    inner: ReceiverStream<io::Result<Bytes>>,
}

impl Stream for ZipStream {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// Encode `entries` as a zip archive, pulling one entry at a time.
///
/// The iterator runs on a blocking thread, so it may do file I/O. It is
/// dropped on that thread once the archive is finished, failed, or the
/// stream was dropped by its consumer.
///
/// The blocking thread is held for the whole download. Sends wait on the
/// consumer with no timeout, so a slow client paces the encoder and an
/// abandoned one releases it at the next send.
pub fn stream_zip<I>(entries: I) -> ZipStream
where
    I: IntoIterator<Item = io::Result<TileEntry>>,
    I::IntoIter: Send + 'static,
{
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let entries = entries.into_iter();

    tokio::task::spawn_blocking(move || {
        let errors = tx.clone();
        let sink = ChannelWriter::new(tx);
        let failed = sink.failed_flag();
        let mut zip = ZipWriter::new_stream(sink);

        match write_entries(&mut zip, entries) {
            Ok(count) => {
                if let Err(e) = zip.finish() {
                    warn!(error = %e, "Failed to finish zip archive");
                    let _ = errors.blocking_send(Err(io::Error::other(e)));
                } else {
                    debug!(entries = count, "Zip archive complete");
                }
            }
            Err(e) => {
                // Silence the sink before the writer drops and writes its
                // central directory.
                if failed.swap(true, Ordering::SeqCst) {
                    debug!("Zip stream consumer went away");
                } else {
                    warn!(error = %e, "Zip archive aborted");
                    let _ = errors.blocking_send(Err(e));
                }
                drop(zip);
            }
        }
    });

    ZipStream {
        inner: ReceiverStream::new(rx),
    }
}

fn write_entries<W, I>(zip: &mut ZipWriter<W>, entries: I) -> io::Result<usize>
where
    W: Write + io::Seek,
    I: Iterator<Item = io::Result<TileEntry>>,
{
    let mut count = 0;
    for entry in entries {
        let entry = entry?;
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .last_modified_time(entry.modified)
            .unix_permissions(entry.permissions)
            .large_file(entry.content.len() as u64 >= zip::ZIP64_BYTES_THR);

        zip.start_file(entry.path.as_str(), options)?;
        zip.write_all(&entry.content)?;
        count += 1;
    }
    Ok(count)
}

fn consumer_dropped() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "zip stream consumer dropped")
}

/// `Write` sink that forwards bytes to an async channel in chunks.
///
/// Once failed, either because the consumer went away or because the archive
/// was aborted, every write is accepted and discarded. The zip writer can then
/// finalize on drop without reporting an error and without sending anything.
///
/// Must only be used from a blocking thread.
struct ChannelWriter {
    tx: mpsc::Sender<io::Result<Bytes>>,
    buffer: BytesMut,
    failed: Arc<AtomicBool>,
}

impl ChannelWriter {
    fn new(tx: mpsc::Sender<io::Result<Bytes>>) -> Self {
        Self {
            tx,
            buffer: BytesMut::with_capacity(CHUNK_SIZE),
            failed: Arc::new(AtomicBool::new(false)),
        }
    }

    fn failed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.failed)
    }

    fn is_failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }

    fn fail(&mut self) -> io::Error {
        self.failed.store(true, Ordering::SeqCst);
        self.buffer.clear();
        consumer_dropped()
    }

    fn send_buffered(&mut self) -> io::Result<()> {
        if self.is_failed() {
            self.buffer.clear();
            return Ok(());
        }
        if self.buffer.is_empty() {
            return Ok(());
        }
        let chunk = self.buffer.split().freeze();
        match self.tx.blocking_send(Ok(chunk)) {
            Ok(()) => Ok(()),
            Err(_) => Err(self.fail()),
        }
    }
}

impl Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.is_failed() {
            return Ok(buf.len());
        }
        if self.tx.is_closed() {
            return Err(self.fail());
        }
        self.buffer.extend_from_slice(buf);
        if self.buffer.len() >= CHUNK_SIZE {
            self.send_buffered()?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.send_buffered()
    }
}

impl Drop for ChannelWriter {
    fn drop(&mut self) {
        let _ = self.send_buffered();
    }
}
