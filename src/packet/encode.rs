use crate::protocol;

/// Largest value a four byte remaining length can carry.
pub const MAX_REMAINING_LENGTH: usize = 268_435_455;

pub(crate) trait EncodePacket {
    const PACKET_TYPE: protocol::PacketType;
    fn flags(&self) -> u8;
    fn required_space(&self) -> usize;
    fn encode_body(&self, cursor: &mut Cursor) -> Result<(), crate::Error>;
}

pub(crate) trait Encode {
    fn encode(&self, cursor: &mut Cursor) -> Result<(), crate::Error>;
    fn required_space(&self) -> usize;
}

/// Number of bytes the remaining length field takes for `len`.
pub fn remaining_length_size(len: usize) -> Result<usize, crate::Error> {
    if len > MAX_REMAINING_LENGTH {
        return Err(crate::Error::MalformedRemainingLength);
    }

    let mut len = len / 128;
    let mut i = 1;

    while len > 0 {
        len /= 128;
        i += 1;
    }

    Ok(i)
}

/// Writes `len` as an MQTT variable byte integer, least significant digit
/// first, and returns the number of bytes written.
pub(crate) fn remaining_length(mut len: usize, cursor: &mut Cursor) -> Result<usize, crate::Error> {
    if len > MAX_REMAINING_LENGTH {
        return Err(crate::Error::MalformedRemainingLength);
    }

    let mut i = 0;

    loop {
        let mut byte = (len % 128) as u8;
        len /= 128;

        if len > 0 {
            byte |= 0x80;
        }

        cursor.write_u8(byte)?;
        i += 1;

        if len == 0 {
            return Ok(i);
        }
    }
}

pub(crate) struct Cursor<'buf> {
    buf: &'buf mut [u8],
    pos: usize,
}

impl<'buf> Cursor<'buf> {
    pub(crate) const fn new(buf: &'buf mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    #[cfg(test)]
    pub(crate) fn written(&self) -> &[u8] {
        &self.buf[..self.pos]
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn write_u8(&mut self, byte: u8) -> Result<(), crate::Error> {
        self.ensure_remaining(1)?;
        self.buf[self.pos] = byte;
        self.pos += 1;

        Ok(())
    }

    pub(crate) fn write_u16(&mut self, value: u16) -> Result<(), crate::Error> {
        self.ensure_remaining(2)?;
        let [one, two] = value.to_be_bytes();
        self.buf[self.pos] = one;
        self.buf[self.pos + 1] = two;
        self.pos += 2;

        Ok(())
    }

    pub(crate) fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), crate::Error> {
        let len = bytes.len();
        self.ensure_remaining(len)?;

        self.buf[self.pos..self.pos + len].copy_from_slice(bytes);
        self.pos += len;

        Ok(())
    }

    pub(crate) fn write_binary_chunk(&mut self, bytes: &[u8]) -> Result<(), crate::Error> {
        let len = u16::try_from(bytes.len()).map_err(|_| crate::Error::OutOfSpace)?;
        self.ensure_remaining(bytes.len() + 2)?;
        self.write_u16(len)?;
        self.write_bytes(bytes)
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn ensure_remaining(&self, n: usize) -> Result<(), crate::Error> {
        if self.remaining() < n {
            Err(crate::Error::OutOfSpace)
        } else {
            Ok(())
        }
    }
}

impl Encode for u16 {
    fn encode(&self, cursor: &mut Cursor) -> Result<(), crate::Error> {
        cursor.write_u16(*self)
    }

    fn required_space(&self) -> usize {
        2
    }
}

impl Encode for u8 {
    fn encode(&self, cursor: &mut Cursor) -> Result<(), crate::Error> {
        cursor.write_u8(*self)
    }

    fn required_space(&self) -> usize {
        1
    }
}

impl Encode for &str {
    fn encode(&self, cursor: &mut Cursor) -> Result<(), crate::Error> {
        cursor.write_binary_chunk(self.as_bytes())
    }

    fn required_space(&self) -> usize {
        self.len() + 2
    }
}

/// Length prefixed binary data. Raw payloads are written with
/// [`Cursor::write_bytes`] instead.
impl Encode for &[u8] {
    fn encode(&self, cursor: &mut Cursor) -> Result<(), crate::Error> {
        cursor.write_binary_chunk(self)
    }

    fn required_space(&self) -> usize {
        self.len() + 2
    }
}
