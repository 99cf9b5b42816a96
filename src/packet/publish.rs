use crate::{
    packet::{
        PacketId, QoS, decode,
        encode::{self, Encode},
    },
    protocol::PacketType,
};

pub(crate) struct Publish<'a> {
    pub(crate) flags: Flags,
    pub(crate) topic: &'a [u8],
    pub(crate) packet_id: Option<PacketId>,
    pub(crate) payload: &'a [u8],
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Flags {
    pub(crate) dup: bool,
    pub(crate) qos: QoS,
    pub(crate) retain: bool,
}

impl TryFrom<u8> for Flags {
    type Error = crate::Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let dup = value & 0b1000 != 0;
        let qos = QoS::try_from((value >> 1) & 0b11)?;
        let retain = value & 0b0001 != 0;

        Ok(Self { dup, qos, retain })
    }
}

impl From<&Flags> for u8 {
    fn from(value: &Flags) -> Self {
        (value.dup as u8) << 3 | (value.qos as u8) << 1 | (value.retain as u8)
    }
}

impl<'a> encode::EncodePacket for &Publish<'a> {
    const PACKET_TYPE: PacketType = PacketType::Publish;

    fn encode_body(&self, cursor: &mut encode::Cursor) -> Result<(), crate::Error> {
        self.topic.encode(cursor)?;
        if let Some(id) = self.packet_id {
            id.encode(cursor)?;
        }
        cursor.write_bytes(self.payload)
    }

    fn flags(&self) -> u8 {
        (&self.flags).into()
    }

    fn required_space(&self) -> usize {
        self.topic.required_space()
            + self.packet_id.map(|id| id.required_space()).unwrap_or(0)
            + self.payload.len()
    }
}

impl<'a> Publish<'a> {
    /// Decodes an inbound PUBLISH body. For QoS 1 and 2 the packet identifier
    /// following the topic is consumed so it never leaks into the payload.
    pub(crate) fn decode(cursor: &mut decode::Cursor<'a>, flags: u8) -> Result<Self, crate::Error> {
        let flags = Flags::try_from(flags)?;

        let topic = cursor.read_binary_chunk()?;

        let packet_id = if let QoS::AtMostOnce = flags.qos {
            None
        } else {
            Some(PacketId::decode(cursor)?)
        };

        let payload = cursor.read_all();

        Ok(Publish {
            flags,
            topic,
            packet_id,
            payload,
        })
    }
}
