use crate::{
    packet::{
        PacketId,
        encode::{self, Encode},
    },
    protocol::PacketType,
};

pub(crate) struct Unsubscribe<'a> {
    pub(crate) packet_id: PacketId,
    pub(crate) topic_filter: &'a [u8],
}

impl<'a> encode::EncodePacket for &Unsubscribe<'a> {
    const PACKET_TYPE: PacketType = PacketType::Unsubscribe;

    fn flags(&self) -> u8 {
        PacketType::Unsubscribe.fixed_flags()
    }

    fn required_space(&self) -> usize {
        self.packet_id.required_space() + self.topic_filter.required_space()
    }

    fn encode_body(&self, cursor: &mut encode::Cursor) -> Result<(), crate::Error> {
        self.packet_id.encode(cursor)?;
        self.topic_filter.encode(cursor)
    }
}
