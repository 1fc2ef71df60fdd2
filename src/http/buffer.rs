//! Growable accumulation buffer for partial reads.
//!
//! # Responsibilities
//! - Receive raw read results into the unfilled suffix
//! - Expose every unconsumed byte as one contiguous slice
//! - Shift the unconsumed tail to the front after the parser consumes a prefix
//!
//! # Design Decisions
//! - Capacity doubles only when the buffer is full, so tiny reads still make progress
//! - Growth is capped; a full buffer at the cap means a single line is too long
//! - Compaction is one `copy_within`, no reallocation

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::http::error::ParseError;

/// Byte buffer that accumulates reads until the parser can consume them.
#[derive(Debug)]
pub struct ByteAccumulator {
    buf: Vec<u8>,
    filled: usize,
    max_capacity: usize,
}

impl ByteAccumulator {
    /// Create a buffer with `initial` bytes of capacity that may grow up to `max`.
    pub fn new(initial: usize, max: usize) -> Self {
        let initial = initial.max(1);
        Self {
            buf: vec![0; initial],
            filled: 0,
            max_capacity: max.max(initial),
        }
    }

    /// Bytes received but not yet consumed.
    pub fn filled(&self) -> &[u8] {
        &self.buf[..self.filled]
    }

    pub fn len(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Make room for at least one more byte, doubling capacity if full.
    fn reserve(&mut self) -> Result<(), ParseError> {
        if self.filled < self.buf.len() {
            return Ok(());
        }
        if self.buf.len() >= self.max_capacity {
            return Err(ParseError::RequestTooLarge { limit: self.max_capacity });
        }
        let grown = (self.buf.len() * 2).min(self.max_capacity);
        tracing::trace!(from = self.buf.len(), to = grown, "Growing request buffer");
        self.buf.resize(grown, 0);
        Ok(())
    }

    /// Perform a single read into the unfilled suffix.
    ///
    /// Returns the number of bytes read; zero means end of stream.
    pub async fn read_from<R>(&mut self, reader: &mut R) -> Result<usize, ParseError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        self.reserve()?;
        let n = reader.read(&mut self.buf[self.filled..]).await?;
        self.filled += n;
        Ok(n)
    }

    /// Append bytes directly, growing as needed.
    pub fn extend_from_slice(&mut self, data: &[u8]) -> Result<(), ParseError> {
        let mut rest = data;
        while !rest.is_empty() {
            self.reserve()?;
            let room = self.buf.len() - self.filled;
            let take = room.min(rest.len());
            self.buf[self.filled..self.filled + take].copy_from_slice(&rest[..take]);
            self.filled += take;
            rest = &rest[take..];
        }
        Ok(())
    }

    /// Drop the first `n` filled bytes and shift the remainder to the front.
    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.filled);
        if n == 0 {
            return;
        }
        self.buf.copy_within(n..self.filled, 0);
        self.filled -= n;
    }
}
