use crate::packet::decode;

/// A complete control packet sitting in the receive buffer.
#[derive(Debug, PartialEq)]
pub(crate) struct Frame<'a> {
    pub(crate) first_byte: u8,
    pub(crate) body: &'a [u8],
}

/// Reassembles the inbound TCP byte stream into complete control packets.
///
/// Bytes are appended as they arrive, complete frames are handed out one by
/// one and the unparsed tail is moved back to the start by [`compact`].
///
/// [`compact`]: RxBuffer::compact
pub struct RxBuffer<const N: usize> {
    buf: [u8; N],
    len: usize,
    read: usize,
    dropped: usize,
}

impl<const N: usize> RxBuffer<N> {
    pub const fn new() -> Self {
        Self {
            buf: [0u8; N],
            len: 0,
            read: 0,
            dropped: 0,
        }
    }

    /// Bytes buffered and not consumed as frames yet.
    pub fn pending(&self) -> usize {
        self.len - self.read
    }

    /// Number of chunks discarded because they did not fit.
    pub fn dropped_chunks(&self) -> usize {
        self.dropped
    }

    /// Appends a received chunk. A chunk that does not fit entirely is
    /// discarded as a whole and `false` is returned.
    pub(crate) fn push(&mut self, chunk: &[u8]) -> bool {
        if self.len + chunk.len() > N {
            self.dropped = self.dropped.saturating_add(1);
            return false;
        }

        self.buf[self.len..self.len + chunk.len()].copy_from_slice(chunk);
        self.len += chunk.len();

        true
    }

    /// Next complete frame, `Ok(None)` when more data is needed.
    ///
    /// A frame that declares more bytes than the buffer can ever hold is
    /// reported as [`crate::Error::MalformedRemainingLength`].
    pub(crate) fn next_frame(&mut self) -> Result<Option<Frame<'_>>, crate::Error> {
        let unparsed = &self.buf[self.read..self.len];

        if unparsed.len() < 2 {
            return Ok(None);
        }

        let Some((remaining_len, len_size)) = decode::remaining_length(&unparsed[1..]) else {
            return Ok(None);
        };

        let total = 1 + len_size + remaining_len;

        if total > N {
            return Err(crate::Error::MalformedRemainingLength);
        }

        if total > unparsed.len() {
            return Ok(None);
        }

        let start = self.read;
        self.read += total;

        Ok(Some(Frame {
            first_byte: self.buf[start],
            body: &self.buf[start + 1 + len_size..start + total],
        }))
    }

    /// Moves the unparsed tail to the start of the buffer.
    pub(crate) fn compact(&mut self) {
        if self.read == 0 {
            return;
        }

        self.buf.copy_within(self.read..self.len, 0);
        self.len -= self.read;
        self.read = 0;
    }

    pub(crate) fn clear(&mut self) {
        self.len = 0;
        self.read = 0;
    }
}

impl<const N: usize> Default for RxBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
