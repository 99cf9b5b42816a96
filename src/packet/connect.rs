use crate::{
    packet::{
        QoS, decode,
        encode::{self, Encode},
    },
    protocol::{PROTOCOL_LEVEL, PROTOCOL_NAME, PacketType},
};

#[derive(Debug)]
pub(crate) struct Connect<'a> {
    pub(crate) clean_session: bool,
    pub(crate) keep_alive: u16,
    pub(crate) client_id: &'a [u8],
    pub(crate) will: Option<Will<'a>>,
    pub(crate) username: Option<&'a [u8]>,
    pub(crate) password: Option<&'a [u8]>,
}

#[derive(Debug)]
pub(crate) struct Will<'a> {
    pub(crate) qos: QoS,
    pub(crate) retain: bool,
    pub(crate) topic: &'a [u8],
    pub(crate) payload: &'a [u8],
}

impl<'a> encode::EncodePacket for &Connect<'a> {
    const PACKET_TYPE: PacketType = PacketType::Connect;

    fn flags(&self) -> u8 {
        0
    }

    fn required_space(&self) -> usize {
        let mut required = PROTOCOL_NAME.required_space()
            + PROTOCOL_LEVEL.required_space()
            + 0u8.required_space()
            + self.keep_alive.required_space()
            + self.client_id.required_space();

        if let Some(will) = &self.will {
            required += will.topic.required_space();
            required += will.payload.required_space();
        }

        if let Some(username) = &self.username {
            required += username.required_space();
        }

        if let Some(password) = &self.password {
            required += password.required_space();
        }

        required
    }

    fn encode_body(&self, cursor: &mut encode::Cursor) -> Result<(), crate::Error> {
        PROTOCOL_NAME.encode(cursor)?;
        PROTOCOL_LEVEL.encode(cursor)?;

        let flags = (self.username.is_some() as u8) << 7
            | (self.password.is_some() as u8) << 6
            | (self.will.as_ref().map(|w| w.retain).unwrap_or(false) as u8) << 5
            | self.will.as_ref().map(|w| w.qos as u8).unwrap_or(0) << 3 // 2 bits
            | (self.will.is_some() as u8) << 2
            | (self.clean_session as u8) << 1;

        flags.encode(cursor)?;
        self.keep_alive.encode(cursor)?;
        self.client_id.encode(cursor)?;

        if let Some(will) = &self.will {
            will.topic.encode(cursor)?;
            will.payload.encode(cursor)?;
        }

        if let Some(username) = &self.username {
            username.encode(cursor)?;
        }

        if let Some(password) = &self.password {
            password.encode(cursor)?;
        }

        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) struct ConnAck {
    pub(crate) session_present: bool,
    pub(crate) return_code: ConnectReturnCode,
}

impl ConnAck {
    /// Only the first two bytes are looked at; anything after them is
    /// tolerated.
    pub(crate) fn decode(cursor: &mut decode::Cursor) -> Result<Self, crate::Error> {
        if cursor.remaining() < 2 {
            return Err(crate::Error::MalformedPacket);
        }

        let flags = cursor.read_u8()?;
        let return_code = ConnectReturnCode::from(cursor.read_u8()?);

        Ok(ConnAck {
            session_present: (flags & 0b0000_0001) != 0,
            return_code,
        })
    }
}

// @note: for MQTT 5.0 it is a whole another story
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectReturnCode {
    Accepted,
    UnacceptableProtocolVersion,
    IdentifierRejected,
    ServerUnavailable,
    BadUserNameOrPassword,
    NotAuthorized,
    Unknown(u8),
}

impl From<u8> for ConnectReturnCode {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Accepted,
            1 => Self::UnacceptableProtocolVersion,
            2 => Self::IdentifierRejected,
            3 => Self::ServerUnavailable,
            4 => Self::BadUserNameOrPassword,
            5 => Self::NotAuthorized,
            other => Self::Unknown(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::packet::{Packet, encode::EncodePacket};

    use super::*;

    #[test]
    fn connack_accepted() {
        let body = [0x00, 0x00];
        let mut cursor = decode::Cursor::new(&body);
        let packet = ConnAck::decode(&mut cursor).unwrap();

        assert!(matches!(
            packet,
            ConnAck {
                session_present: false,
                return_code: ConnectReturnCode::Accepted
            }
        ));
    }

    #[test]
    fn connack_refused() {
        let body = [0x00, 0x05];
        let mut cursor = decode::Cursor::new(&body);
        let packet = ConnAck::decode(&mut cursor).unwrap();

        assert_eq!(packet.return_code, ConnectReturnCode::NotAuthorized);
    }

    #[test]
    fn connack_too_short() {
        let body = [0x00];
        let mut cursor = decode::Cursor::new(&body);

        assert!(matches!(
            ConnAck::decode(&mut cursor),
            Err(crate::Error::MalformedPacket)
        ));
    }

    #[test]
    fn connect_encode_flags() {
        let connect = Connect {
            client_id: b"Client",
            clean_session: true,
            keep_alive: 60,
            will: None,
            username: None,
            password: None,
        };

        let mut buf = [0u8; 32];
        let mut cursor = encode::Cursor::new(&mut buf);
        (&connect).encode_body(&mut cursor).unwrap();

        // [
        //   0, 4,   77, 81, 84, 84,    // "MQTT"
        //   4,                         // MQTT version
        //   2,                         // Flags
        //   0, 60,                     // keep_alive
        //   0, 6,   67, 108, 105, 101, 110, 116    // "Client"
        // ]
        assert_eq!(cursor.written().len(), 18);
        assert_eq!((&connect).required_space(), 18);
        assert_eq!(&buf[2..6], b"MQTT");
        assert_eq!(buf[6], 4);
        assert_eq!(buf[7], 0b0000_0010);
        assert_eq!(u16::from_be_bytes([buf[8], buf[9]]), 60);

        let len = u16::from_be_bytes([buf[10], buf[11]]) as usize;
        assert_eq!(&buf[12..12 + len], b"Client");
    }

    #[test]
    fn connect_packet_for_dev_is_stable() {
        let build = || {
            let connect = Connect {
                client_id: b"dev",
                clean_session: true,
                keep_alive: 60,
                will: None,
                username: None,
                password: None,
            };

            let mut buf = [0u8; 32];
            let mut cursor = encode::Cursor::new(&mut buf);
            Packet::Connect(connect).encode(&mut cursor).unwrap();
            let len = cursor.position();
            (buf, len)
        };

        let (first, len) = build();
        let (second, _) = build();

        assert_eq!(
            &first[..len],
            &[
                0x10, 15, 0, 4, b'M', b'Q', b'T', b'T', 4, 0x02, 0, 60, 0, 3, b'd', b'e', b'v'
            ]
        );
        assert_eq!(first, second);
    }

    #[test]
    fn connect_encode_with_will_username_password() {
        let will = Will {
            topic: b"topic1",
            payload: b"heavy-load",
            qos: QoS::AtLeastOnce,
            retain: true,
        };

        let connect = Connect {
            client_id: b"Client 2",
            clean_session: true,
            keep_alive: 120,
            will: Some(will),
            username: Some(b"user 1"),
            password: Some(b"long-pass"),
        };

        let mut buf = [0u8; 64];
        let mut cursor = encode::Cursor::new(&mut buf);
        (&connect).encode_body(&mut cursor).unwrap();

        assert_eq!(cursor.written().len(), 59);

        assert_eq!(buf[7], 0b1110_1110);
        assert_eq!(u16::from_be_bytes([buf[8], buf[9]]), 120);

        let len = u16::from_be_bytes([buf[10], buf[11]]) as usize;
        assert_eq!(&buf[12..12 + len], b"Client 2");

        let len = u16::from_be_bytes([buf[20], buf[21]]) as usize;
        assert_eq!(&buf[22..22 + len], b"topic1");

        let len = u16::from_be_bytes([buf[28], buf[29]]) as usize;
        assert_eq!(&buf[30..30 + len], b"heavy-load");

        let len = u16::from_be_bytes([buf[40], buf[41]]) as usize;
        assert_eq!(&buf[42..42 + len], b"user 1");

        let len = u16::from_be_bytes([buf[48], buf[49]]) as usize;
        assert_eq!(&buf[50..50 + len], b"long-pass");
    }

    #[test]
    fn will_qos_lands_in_bits_three_and_four() {
        let connect = Connect {
            client_id: b"c",
            clean_session: true,
            keep_alive: 60,
            will: Some(Will {
                topic: b"t",
                payload: b"",
                qos: QoS::ExactlyOnce,
                retain: false,
            }),
            username: None,
            password: None,
        };

        let mut buf = [0u8; 32];
        let mut cursor = encode::Cursor::new(&mut buf);
        (&connect).encode_body(&mut cursor).unwrap();

        assert_eq!(buf[7], 0b0001_0110);
    }
}
