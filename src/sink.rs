use parking_lot::Mutex;
use std::io;
use std::sync::Arc;

/// Destination for fully rendered log lines.
///
/// Implementations transport bytes to a concrete target (file, stdout,
/// socket, memory). The handler serializes all calls on one destination
/// behind its own lock, so an implementation never sees two lines at once
/// and needs no locking of its own.
///
/// Every `std::io::Write + Send` type is a sink.
pub trait LogSink: Send {
    /// Write one complete line, including its trailing newline.
    ///
    /// **Parameters**
    /// - `line`: the rendered record.
    ///
    /// **Returns**
    /// - `Ok(())` if the destination accepted the whole line.
    /// - `Err(..)` if it did not. The handler hands this error to its caller
    ///   as-is; it does not retry and does not log it.
    fn write_record(&mut self, line: &[u8]) -> io::Result<()>;

    /// Flush anything the destination buffers internally.
    ///
    /// Default implementation is a no-op.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<W: io::Write + Send> LogSink for W {
    fn write_record(&mut self, line: &[u8]) -> io::Result<()> {
        io::Write::write_all(self, line)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::Write::flush(self)
    }
}

/// Cloneable in-memory destination; all clones share one buffer.
///
/// Handy for tests and for capturing output of a short-lived logger.
#[derive(Clone, Default, Debug)]
pub struct MemorySink {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        MemorySink::default()
    }

    /// Everything written so far, lossily decoded as UTF-8.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }

    /// Captured lines without their terminators.
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    pub fn clear(&self) {
        self.bytes.lock().clear();
    }
}

impl LogSink for MemorySink {
    fn write_record(&mut self, line: &[u8]) -> io::Result<()> {
        self.bytes.lock().extend_from_slice(line);
        Ok(())
    }
}
