//! Output sink shared by a logger family
//!
//! A [`Sink`] wraps one writer behind a mutex. Every clone of a sink, and so
//! every logger derived from the same root, writes through the same lock, so
//! concurrent records never interleave.

use super::error::Result;
use parking_lot::Mutex;
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

#[derive(Clone)]
pub struct Sink {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Sink {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    /// Write one complete record. The lock is held only for the write.
    pub fn write(&self, buffer: &[u8]) -> Result<()> {
        let mut writer = self.writer.lock();
        writer.write_all(buffer)?;
        writer.flush()?;
        Ok(())
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink").finish_non_exhaustive()
    }
}

/// Fallback stream for failures inside the logger itself.
///
/// Never the primary sink, so a broken sink cannot recurse into itself.
#[derive(Clone, Debug)]
pub struct Diagnostics {
    sink: Sink,
}

impl Diagnostics {
    pub fn stderr() -> Self {
        Self {
            sink: Sink::stderr(),
        }
    }

    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            sink: Sink::new(writer),
        }
    }

    pub fn report(&self, what: &str, err: &dyn fmt::Display) {
        let line = format!("[LOGGER ERROR] {}: {}\n", what, err);
        // Nowhere left to report a failure of the fallback stream.
        let _ = self.sink.write(line.as_bytes());
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::stderr()
    }
}

#[derive(Debug, Default)]
struct Buffer {
    bytes: Vec<u8>,
    writes: usize,
}

/// In-memory writer that records every write, for tests and capture.
///
/// Clones share the same buffer.
///
/// ```
/// use chain_logger::BufferSink;
/// use std::io::Write;
///
/// let buffer = BufferSink::new();
/// let mut writer = buffer.clone();
/// writer.write_all(b"one\n").unwrap();
///
/// assert_eq!(buffer.lines(), vec!["one".to_string()]);
/// assert_eq!(buffer.write_count(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct BufferSink {
    inner: Arc<Mutex<Buffer>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock().bytes).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    /// Number of `write` calls received.
    pub fn write_count(&self) -> usize {
        self.inner.lock().writes
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().bytes.is_empty()
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.bytes.clear();
        inner.writes = 0;
    }
}

impl Write for BufferSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self.inner.lock();
        inner.bytes.extend_from_slice(buf);
        inner.writes += 1;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
