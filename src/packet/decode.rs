/// Decodes a remaining length field from the start of `bytes`.
///
/// Returns the value and the number of bytes it occupied, or `None` when the
/// field continues past the end of `bytes`. Decoding stops after four bytes
/// even when the continuation bit is still set.
pub fn remaining_length(bytes: &[u8]) -> Option<(usize, usize)> {
    let mut value: usize = 0;
    let mut multiplier: usize = 1;

    for (i, byte) in bytes.iter().enumerate() {
        value += (*byte & 0x7F) as usize * multiplier;

        if byte & 0x80 == 0 || i == 3 {
            return Some((value, i + 1));
        }

        multiplier *= 128;
    }

    None
}

pub(crate) struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) const fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, crate::Error> {
        self.ensure_remaining(1)?;
        let res = self.buf[self.pos];
        self.pos += 1;

        Ok(res)
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16, crate::Error> {
        self.ensure_remaining(2)?;
        let res = u16::from_be_bytes([self.buf[self.pos], self.buf[self.pos + 1]]);
        self.pos += 2;

        Ok(res)
    }

    pub(crate) fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], crate::Error> {
        self.ensure_remaining(len)?;
        let res = &self.buf[self.pos..self.pos + len];
        self.pos += len;

        Ok(res)
    }

    pub(crate) fn read_binary_chunk(&mut self) -> Result<&'a [u8], crate::Error> {
        let len = self.read_u16()? as usize;
        self.read_bytes(len)
    }

    /// Everything not read yet.
    pub(crate) fn read_all(&mut self) -> &'a [u8] {
        let res = &self.buf[self.pos..];
        self.pos = self.buf.len();

        res
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn ensure_remaining(&self, n: usize) -> Result<(), crate::Error> {
        if self.remaining() < n {
            Err(crate::Error::UnexpectedEof)
        } else {
            Ok(())
        }
    }
}
