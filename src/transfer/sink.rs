//! In-memory accumulation of received chunks.

use bytes::{Bytes, BytesMut};

/// Largest capacity reserved up front from a declared total. Growth past
/// this is amortized by `BytesMut`.
const MAX_PREALLOCATION: usize = 16 * 1024 * 1024;

/// Accumulates chunks in arrival order into one contiguous payload.
///
/// Appends are amortized linear over the whole transfer. The payload is only
/// reachable through [`finish`](Self::finish); [`discard`](Self::discard)
/// drops it without exposing the partial contents.
#[derive(Debug, Default)]
pub struct ByteSink {
    buf: BytesMut,
}

impl ByteSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves room for an expected payload size.
    pub fn reserve_for(&mut self, expected: u64) {
        let wanted = usize::try_from(expected)
            .unwrap_or(usize::MAX)
            .min(MAX_PREALLOCATION);
        self.buf.reserve(wanted.saturating_sub(self.buf.len()));
    }

    /// Appends a chunk.
    pub fn append(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Bytes accumulated so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if nothing has been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Releases the accumulated payload.
    #[must_use]
    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }

    /// Drops the accumulated bytes.
    pub fn discard(self) {
        drop(self.buf);
    }
}
