use crate::{
    packet::{
        PacketId, QoS,
        encode::{self, Encode},
    },
    protocol::PacketType,
};

/// SUBSCRIBE carrying a single topic filter.
pub(crate) struct Subscribe<'a> {
    pub(crate) packet_id: PacketId,
    pub(crate) topic_filter: &'a [u8],
    pub(crate) qos: QoS,
}

impl<'a> encode::EncodePacket for &Subscribe<'a> {
    const PACKET_TYPE: PacketType = PacketType::Subscribe;

    fn flags(&self) -> u8 {
        PacketType::Subscribe.fixed_flags()
    }

    fn required_space(&self) -> usize {
        self.packet_id.required_space() + self.topic_filter.required_space() + self.qos.required_space()
    }

    fn encode_body(&self, cursor: &mut encode::Cursor) -> Result<(), crate::Error> {
        self.packet_id.encode(cursor)?;
        self.topic_filter.encode(cursor)?;
        self.qos.encode(cursor)
    }
}

#[cfg(test)]
mod tests {
    use crate::packet::Packet;

    use super::*;

    #[test]
    fn encode_single_filter() {
        let packet = Subscribe {
            packet_id: PacketId(10),
            topic_filter: b"a/#",
            qos: QoS::AtLeastOnce,
        };

        let mut buf = [0u8; 16];
        let mut cursor = encode::Cursor::new(&mut buf);
        Packet::Subscribe(packet).encode(&mut cursor).unwrap();

        assert_eq!(
            cursor.written(),
            &[0x82, 8, 0x00, 0x0A, 0x00, 0x03, b'a', b'/', b'#', 0x01]
        );
    }
}
