use crate::{
    packet::{
        connect::{ConnAck, Connect},
        encode::Encode,
        publish::Publish,
        subscribe::Subscribe,
        unsubscribe::Unsubscribe,
    },
    protocol::{FixedHeader, PacketType},
};

pub mod connect;
pub mod decode;
pub mod encode;
pub mod publish;
pub mod subscribe;
pub mod unsubscribe;

/// Control packets the client builds or understands.
pub(crate) enum Packet<'a> {
    Connect(Connect<'a>),
    ConnAck(ConnAck),
    Publish(Publish<'a>),
    /// PUBACK, PUBREC, PUBREL, PUBCOMP, SUBACK and UNSUBACK. Their body is not
    /// interpreted, they only count as broker activity.
    Ack(PacketType),
    Subscribe(Subscribe<'a>),
    Unsubscribe(Unsubscribe<'a>),
    PingReq,
    PingResp,
    Disconnect,
    /// A valid packet type the client has no use for.
    Ignored(PacketType),
}

impl<'buf> Packet<'buf> {
    pub(crate) fn encode(&self, cursor: &mut encode::Cursor) -> Result<(), crate::Error> {
        match self {
            Self::Connect(packet) => encode_packet(packet, cursor),
            Self::Publish(packet) => encode_packet(packet, cursor),
            Self::Subscribe(packet) => encode_packet(packet, cursor),
            Self::Unsubscribe(packet) => encode_packet(packet, cursor),
            Self::PingReq => empty_body(cursor, PacketType::PingReq),
            Self::Disconnect => empty_body(cursor, PacketType::Disconnect),
            _ => Err(crate::Error::UnsupportedPacket),
        }
    }

    pub(crate) fn decode(header: &FixedHeader, body: &'buf [u8]) -> Result<Self, crate::Error> {
        if header.remaining_len != body.len() {
            return Err(crate::Error::MalformedRemainingLength);
        }

        let cursor = &mut decode::Cursor::new(body);

        match header.packet_type {
            PacketType::ConnAck => ConnAck::decode(cursor).map(Packet::ConnAck),
            PacketType::Publish => Publish::decode(cursor, header.flags).map(Packet::Publish),
            ack @ (PacketType::PubAck
            | PacketType::PubRec
            | PacketType::PubRel
            | PacketType::PubComp
            | PacketType::SubAck
            | PacketType::UnsubAck) => Ok(Packet::Ack(ack)),
            PacketType::PingResp => Ok(Packet::PingResp),
            other => Ok(Packet::Ignored(other)),
        }
    }
}

fn encode_packet<P: encode::EncodePacket>(
    packet: P,
    cursor: &mut encode::Cursor<'_>,
) -> Result<(), crate::Error> {
    let header = ((P::PACKET_TYPE as u8) << 4) | (packet.flags() & 0x0F);
    cursor.write_u8(header)?;

    encode::remaining_length(packet.required_space(), cursor)?;

    packet.encode_body(cursor)
}

fn empty_body(cursor: &mut encode::Cursor, packet_type: PacketType) -> Result<(), crate::Error> {
    let header = ((packet_type as u8) << 4) | packet_type.fixed_flags();

    header.encode(cursor)?;
    0u8.encode(cursor)
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum QoS {
    #[default]
    AtMostOnce = 0,
    AtLeastOnce = 1,
    ExactlyOnce = 2,
}

impl TryFrom<u8> for QoS {
    type Error = crate::Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let qos = match value {
            0 => Self::AtMostOnce,
            1 => Self::AtLeastOnce,
            2 => Self::ExactlyOnce,
            _ => return Err(crate::Error::InvalidQoS),
        };

        Ok(qos)
    }
}

impl encode::Encode for QoS {
    fn encode(&self, cursor: &mut encode::Cursor) -> Result<(), crate::Error> {
        (*self as u8).encode(cursor)
    }

    fn required_space(&self) -> usize {
        1
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PacketId(pub(crate) u16);

impl PacketId {
    pub fn get(&self) -> u16 {
        self.0
    }

    fn decode(cursor: &mut decode::Cursor) -> Result<Self, crate::Error> {
        Self::try_from(cursor.read_u16()?)
    }
}

impl TryFrom<u16> for PacketId {
    type Error = crate::Error;

    fn try_from(id: u16) -> Result<Self, Self::Error> {
        if id == 0 {
            return Err(crate::Error::MalformedPacket);
        }

        Ok(Self(id))
    }
}

impl encode::Encode for PacketId {
    fn encode(&self, cursor: &mut encode::Cursor) -> Result<(), crate::Error> {
        self.0.encode(cursor)
    }

    fn required_space(&self) -> usize {
        2
    }
}
