use std::{
    fmt,
    io::{self, Read},
};

use crate::{error::Error, memblock::MemBlock};


/// Minimum usable capacity of the text window. Tokens are materialized into
/// a separate scratch buffer, so the window itself only needs room for a
/// healthy refill granularity.
pub(crate) const MIN_BUFFER_SIZE: usize = 64;

/// A fixed-capacity text window refilled from an `io::Read` on demand.
///
/// This is the ASCII tokenizer's only view of the stream: a contiguous slice
/// of not-yet-consumed bytes between `start` and `end`, plus the running
/// total of consumed bytes. Unlike a growable parse buffer, the capacity is
/// bounded by the caller's transfer block; lookahead never exceeds it.
pub(crate) struct Buffer<R: Read> {
    reader: R,
    buf: Vec<u8>,

    /// First byte in `buf` that is real data. Invariant: `start <= end`.
    start: usize,

    /// One past the last byte of real data. Invariant: `end <= buf.len()`.
    end: usize,

    /// True once the underlying reader returned 0 bytes.
    exhausted: bool,

    consumed_total: u64,
}

impl<R: Read> Buffer<R> {
    pub(crate) fn new(reader: R, block: MemBlock) -> Result<Self, Error> {
        let size = block.len();
        if size < MIN_BUFFER_SIZE {
            return Err(Error::InvalidBufferSize { size });
        }

        let mut out = Self {
            reader,
            buf: block.into_vec(),
            start: 0,
            end: 0,
            exhausted: false,
            consumed_total: 0,
        };

        // Prefill once so `head` is cheap on the happy path.
        out.fill()?;
        Ok(out)
    }

    fn len(&self) -> usize {
        self.end - self.start
    }

    /// Compacts the window and reads new data to its back. Ignores
    /// `Interrupted`; records EOF.
    fn fill(&mut self) -> Result<usize, Error> {
        if self.start > 0 {
            self.buf.copy_within(self.start..self.end, 0);
            self.end -= self.start;
            self.start = 0;
        }

        let mut total = 0;
        while self.end < self.buf.len() {
            match self.reader.read(&mut self.buf[self.end..]) {
                Ok(0) => {
                    self.exhausted = true;
                    break;
                }
                Ok(n) => {
                    self.end += n;
                    total += n;
                    break;
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(total)
    }

    /// The next unconsumed byte, refilling if necessary. `None` at end of
    /// input.
    pub(crate) fn head(&mut self) -> Result<Option<u8>, Error> {
        if self.len() == 0 {
            if self.exhausted {
                return Ok(None);
            }
            self.fill()?;
            if self.len() == 0 {
                return Ok(None);
            }
        }

        Ok(Some(self.buf[self.start]))
    }

    pub(crate) fn consume(&mut self, num_bytes: usize) {
        debug_assert!(self.start + num_bytes <= self.end);
        self.start += num_bytes;
        self.consumed_total += num_bytes as u64;
    }

    /// Total number of bytes consumed from the stream so far.
    pub(crate) fn offset(&self) -> u64 {
        self.consumed_total
    }
}

impl<R: Read> fmt::Debug for Buffer<R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Buffer {{ consumed_total: {}, .. }}", self.consumed_total)
    }
}
