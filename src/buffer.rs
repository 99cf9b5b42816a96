use heapless::Vec;

use crate::packet::{Packet, encode};

/// The single outbound buffer. Every build overwrites the previous packet.
pub struct TxBuffer<const N: usize> {
    buf: [u8; N],
    len: usize,
}

impl<const N: usize> TxBuffer<N> {
    pub const fn new() -> Self {
        Self {
            buf: [0u8; N],
            len: 0,
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// The most recently built packet.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub(crate) fn clear(&mut self) {
        self.len = 0;
    }

    pub(crate) fn build(&mut self, packet: &Packet) -> Result<&[u8], crate::Error> {
        self.len = 0;

        let mut cursor = encode::Cursor::new(&mut self.buf);
        packet.encode(&mut cursor)?;
        self.len = cursor.position();

        Ok(&self.buf[..self.len])
    }
}

impl<const N: usize> Default for TxBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Copies as much of `src` as fits into a bounded vector, dropping the rest.
pub(crate) fn truncated<const N: usize>(src: &[u8]) -> Vec<u8, N> {
    let len = src.len().min(N);
    let mut dst = Vec::new();
    // `len` never exceeds the capacity
    let _ = dst.extend_from_slice(&src[..len]);

    dst
}

/// Copies as much of `src` as fits into `dst` and returns the copied length.
pub(crate) fn copy_truncated(src: &[u8], dst: &mut [u8]) -> usize {
    let len = src.len().min(dst.len());
    dst[..len].copy_from_slice(&src[..len]);

    len
}
