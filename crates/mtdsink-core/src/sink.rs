//! Byte sink trait
//!
//! Generic interface for anything that accepts a sequential byte stream.
//! [`crate::MtdWriter`] is the device-backed implementation.

use crate::error::Result;

/// A sequential byte-stream sink
pub trait ByteSink {
    /// Append `buf` to the stream.
    ///
    /// On success the whole buffer was accepted and `buf.len()` is
    /// returned; acceptance is all-or-nothing with respect to capacity.
    fn put_bytes(&mut self, buf: &[u8]) -> Result<usize>;

    /// Append a single byte to the stream
    fn put_byte(&mut self, byte: u8) -> Result<()> {
        self.put_bytes(&[byte])?;
        Ok(())
    }

    /// Commit any buffered partial data to the underlying sink
    fn flush(&mut self) -> Result<()>;
}
