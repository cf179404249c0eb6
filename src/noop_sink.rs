use crate::sink::LogSink;
use std::io;

/// A sink that simply drops all records.
///
/// Useful for measuring the overhead of the handler itself without any
/// I/O, and for tests that only care about what reaches the destination
/// boundary.
#[derive(Clone, Copy, Default, Debug)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn write_record(&mut self, _line: &[u8]) -> io::Result<()> {
        Ok(())
    }
}
