use std::io::{self, Write};

use tracing::trace;

use crate::config::DEFAULT_BUFFER_CAPACITY;
use crate::error::{StowError, StowResult};

/// Bytes kept free at the end of the block. Wider than the largest single
/// field write (a 4-byte word), so no field ever straddles a flush.
pub const HEADROOM: usize = 7;

/// Coalesces many small field writes into few large sink writes.
///
/// A single instance serves one whole save: the encoder threads it by
/// `&mut` through every recursive call so the tree goes out as one
/// continuous stream.
pub struct BlockWriter<W: Write> {
    sink: W,
    block: Vec<u8>,
    /// Fill position within `block`.
    index: usize,
    flushes: usize,
    bytes: u64,
}

impl<W: Write> BlockWriter<W> {
    pub fn new(sink: W) -> Self {
        Self::with_capacity(sink, DEFAULT_BUFFER_CAPACITY)
    }

    /// Callers validate `capacity` through [`crate::StowConfig::validate`].
    pub fn with_capacity(sink: W, capacity: usize) -> Self {
        debug_assert!(capacity > HEADROOM);
        Self {
            sink,
            block: vec![0u8; capacity],
            index: 0,
            flushes: 0,
            bytes: 0,
        }
    }

    /// Append bytes, flushing whenever headroom drops below [`HEADROOM`].
    pub fn write(&mut self, mut data: &[u8]) -> StowResult<()> {
        let limit = self.block.len() - HEADROOM;
        while !data.is_empty() {
            let room = limit + 1 - self.index;
            let n = room.min(data.len());
            self.block[self.index..self.index + n].copy_from_slice(&data[..n]);
            self.index += n;
            data = &data[n..];

            if self.index > limit {
                self.flush()?;
            }
        }
        Ok(())
    }

    /// Write the filled region to the sink, if any, and start over.
    pub fn flush(&mut self) -> StowResult<()> {
        if self.index == 0 {
            return Ok(());
        }

        self.flushes += 1;
        let expected = self.index;
        let mut written = 0;
        while written < expected {
            match self.sink.write(&self.block[written..expected]) {
                Ok(0) => {
                    self.bytes += written as u64;
                    return Err(StowError::ShortWrite { expected, written });
                }
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.bytes += written as u64;
                    return Err(e.into());
                }
            }
        }
        self.bytes += written as u64;
        self.index = 0;

        trace!(flush = self.flushes, len = expected, "block flushed");
        Ok(())
    }

    /// Clear the fill position and both counters.
    pub fn reset(&mut self) {
        self.index = 0;
        self.flushes = 0;
        self.bytes = 0;
    }

    /// Flush remaining bytes and the sink itself.
    pub fn finish(&mut self) -> StowResult<()> {
        self.flush()?;
        self.sink.flush()?;
        Ok(())
    }

    /// Number of sink writes performed since the last reset.
    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    /// Bytes handed to the sink since the last reset.
    pub fn bytes_written(&self) -> u64 {
        self.bytes
    }

    /// Bytes waiting in the block.
    pub fn pending(&self) -> usize {
        self.index
    }

    pub fn capacity(&self) -> usize {
        self.block.len()
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    /// Unwraps the sink. Unflushed bytes are discarded.
    pub fn into_inner(self) -> W {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sink that accepts a fixed number of bytes, then refuses.
    struct Limited {
        data: Vec<u8>,
        room: usize,
    }

    impl Write for Limited {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let n = buf.len().min(self.room);
            self.data.extend_from_slice(&buf[..n]);
            self.room -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct Failing;

    impl Write for Failing {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn small_writes_stay_buffered() {
        let mut w = BlockWriter::new(Vec::new());
        w.write(b"abc").unwrap();
        w.write(&42u32.to_ne_bytes()).unwrap();
        assert_eq!(w.pending(), 7);
        assert_eq!(w.flush_count(), 0);
        assert!(w.get_ref().is_empty());
    }

    #[test]
    fn flush_empty_is_noop() {
        let mut w = BlockWriter::new(Vec::new());
        w.flush().unwrap();
        assert_eq!(w.flush_count(), 0);
        assert_eq!(w.bytes_written(), 0);
    }

    #[test]
    fn flush_writes_filled_region() {
        let mut w = BlockWriter::new(Vec::new());
        w.write(b"hello").unwrap();
        w.flush().unwrap();
        assert_eq!(w.flush_count(), 1);
        assert_eq!(w.bytes_written(), 5);
        assert_eq!(w.pending(), 0);
        assert_eq!(w.into_inner(), b"hello");
    }

    #[test]
    fn auto_flush_keeps_headroom() {
        let mut w = BlockWriter::with_capacity(Vec::new(), 16);
        // Threshold is 16 - 7 = 9: the 10th byte triggers a flush.
        w.write(&[1u8; 9]).unwrap();
        assert_eq!(w.flush_count(), 0);
        assert_eq!(w.pending(), 9);
        w.write(&[2u8]).unwrap();
        assert_eq!(w.flush_count(), 1);
        assert_eq!(w.pending(), 0);
        assert_eq!(w.bytes_written(), 10);
    }

    #[test]
    fn large_write_spans_many_blocks() {
        let data: Vec<u8> = (0..100u32).map(|i| i as u8).collect();
        let mut w = BlockWriter::with_capacity(Vec::new(), 17);
        w.write(&data).unwrap();
        w.finish().unwrap();
        // Each automatic flush carries 11 bytes (17 - 7 + 1).
        assert_eq!(w.flush_count(), 100 / 11 + 1);
        assert_eq!(w.bytes_written(), 100);
        assert_eq!(w.into_inner(), data);
    }

    #[test]
    fn reset_clears_counters() {
        let mut w = BlockWriter::new(Vec::new());
        w.write(b"data").unwrap();
        w.flush().unwrap();
        w.write(b"more").unwrap();
        w.reset();
        assert_eq!(w.flush_count(), 0);
        assert_eq!(w.bytes_written(), 0);
        assert_eq!(w.pending(), 0);
    }

    #[test]
    fn short_write_reported() {
        let mut w = BlockWriter::new(Limited { data: Vec::new(), room: 3 });
        w.write(b"abcdef").unwrap();
        let err = w.flush().unwrap_err();
        assert!(matches!(err, StowError::ShortWrite { expected: 6, written: 3 }));
    }

    #[test]
    fn sink_error_propagates_from_auto_flush() {
        let mut w = BlockWriter::with_capacity(Failing, 10);
        let err = w.write(&[0u8; 20]).unwrap_err();
        assert!(matches!(err, StowError::Io(_)));
    }
}
