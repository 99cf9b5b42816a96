//! Boundary to the emulated CPU.
//!
//! Requests carry addresses into the host's memory instead of slices. Every
//! address range is checked against [`Memory`] before the client sees it, and
//! results come back as `i32`: the value on success, a negative errno
//! otherwise.

use embedded_time::Clock;

use crate::{
    client::Client,
    config::{MAX_CLIENT_ID_LEN, MAX_HOSTNAME_LEN},
    packet::QoS,
    transport::Transport,
};

pub const EIO: i32 = -5;
pub const ENOMEM: i32 = -12;
pub const EBUSY: i32 = -16;
pub const EINVAL: i32 = -22;
pub const ENOTCONN: i32 = -107;

pub fn errno(error: crate::Error) -> i32 {
    match error {
        crate::Error::Busy => EBUSY,
        crate::Error::NotConnected => ENOTCONN,
        crate::Error::OutOfSpace => ENOMEM,
        crate::Error::InvalidArgument | crate::Error::InvalidQoS => EINVAL,
        _ => EIO,
    }
}

/// `len` bytes starting at `addr` in host memory.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Region {
    pub addr: usize,
    pub len: usize,
}

impl Region {
    pub const fn new(addr: usize, len: usize) -> Self {
        Self { addr, len }
    }
}

/// The host's address space, normally [`HOST_MEMORY_SIZE`](crate::config::HOST_MEMORY_SIZE) bytes.
pub struct Memory<'m> {
    bytes: &'m mut [u8],
}

impl<'m> Memory<'m> {
    pub fn new(bytes: &'m mut [u8]) -> Self {
        Self { bytes }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn slice(&self, region: Region) -> Result<&[u8], crate::Error> {
        let end = self.end(region)?;
        Ok(&self.bytes[region.addr..end])
    }

    pub fn slice_mut(&mut self, region: Region) -> Result<&mut [u8], crate::Error> {
        let end = self.end(region)?;
        Ok(&mut self.bytes[region.addr..end])
    }

    /// NUL terminated UTF-8 string at `addr`, at most `max_len` bytes long
    /// without the terminator.
    pub fn c_str(&self, addr: usize, max_len: usize) -> Result<&str, crate::Error> {
        let tail = self.bytes.get(addr..).ok_or(crate::Error::InvalidArgument)?;
        let window = &tail[..tail.len().min(max_len.saturating_add(1))];
        let len = window
            .iter()
            .position(|&b| b == 0)
            .ok_or(crate::Error::InvalidArgument)?;

        core::str::from_utf8(&window[..len]).map_err(|_| crate::Error::InvalidArgument)
    }

    /// Raw bytes at `addr` up to the first NUL, cut at `max_len` bytes when
    /// no NUL comes first.
    pub fn c_bytes(&self, addr: usize, max_len: usize) -> Result<&[u8], crate::Error> {
        let tail = self.bytes.get(addr..).ok_or(crate::Error::InvalidArgument)?;
        let window = &tail[..tail.len().min(max_len)];
        let len = window.iter().position(|&b| b == 0).unwrap_or(window.len());

        Ok(&window[..len])
    }

    fn end(&self, region: Region) -> Result<usize, crate::Error> {
        region
            .addr
            .checked_add(region.len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(crate::Error::InvalidArgument)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Request {
    Connect {
        hostname: usize,
        client_id: usize,
        port: u16,
    },
    Disconnect,
    Publish {
        qos: u8,
        retain: bool,
        topic: Region,
        payload: Region,
    },
    Subscribe {
        qos: u8,
        topic: Region,
    },
    Unsubscribe {
        topic: Region,
    },
    Poll,
    ReadMessage {
        buffer: Region,
    },
    GetTopic {
        buffer: Region,
    },
    Connected,
    SetAuth {
        username: Region,
        password: Region,
    },
    SetWill {
        qos: u8,
        retain: bool,
        topic: Region,
        payload: Region,
    },
}

/// Runs one host request against the client.
pub fn dispatch<C, T, const TX: usize, const RX: usize>(
    client: &mut Client<C, T, TX, RX>,
    memory: &mut Memory<'_>,
    request: Request,
) -> i32
where
    C: Clock,
    T: Transport,
{
    match execute(client, memory, request) {
        Ok(value) => value,
        Err(e) => {
            debug!("host: {:?} failed: {:?}", request, e);
            errno(e)
        }
    }
}

fn execute<C, T, const TX: usize, const RX: usize>(
    client: &mut Client<C, T, TX, RX>,
    memory: &mut Memory<'_>,
    request: Request,
) -> Result<i32, crate::Error>
where
    C: Clock,
    T: Transport,
{
    match request {
        Request::Connect {
            hostname,
            client_id,
            port,
        } => {
            let hostname = memory.c_str(hostname, MAX_HOSTNAME_LEN)?;
            let client_id = memory.c_bytes(client_id, MAX_CLIENT_ID_LEN)?;
            client.connect(hostname, port, client_id)?;
        }
        Request::Disconnect => client.disconnect()?,
        Request::Publish {
            qos,
            retain,
            topic,
            payload,
        } => {
            let qos = QoS::try_from(qos)?;
            client.publish(memory.slice(topic)?, memory.slice(payload)?, qos, retain)?;
        }
        Request::Subscribe { qos, topic } => {
            let qos = QoS::try_from(qos)?;
            client.subscribe(memory.slice(topic)?, qos)?;
        }
        Request::Unsubscribe { topic } => client.unsubscribe(memory.slice(topic)?)?,
        Request::Poll => return length(client.poll()),
        Request::ReadMessage { buffer } => {
            return length(client.read_message(memory.slice_mut(buffer)?));
        }
        Request::GetTopic { buffer } => {
            return length(client.get_topic(memory.slice_mut(buffer)?));
        }
        Request::Connected => return Ok(client.connected() as i32),
        Request::SetAuth { username, password } => {
            client.set_auth(memory.slice(username)?, memory.slice(password)?);
        }
        Request::SetWill {
            qos,
            retain,
            topic,
            payload,
        } => {
            let qos = QoS::try_from(qos)?;
            client.set_will(memory.slice(topic)?, memory.slice(payload)?, qos, retain);
        }
    }

    Ok(0)
}

fn length(len: usize) -> Result<i32, crate::Error> {
    i32::try_from(len).map_err(|_| crate::Error::OutOfSpace)
}

#[cfg(test)]
mod tests {
    use crate::{
        config::Config,
        testing::{MockTransport, TestClock},
        transport::Event,
    };

    use super::*;

    fn place(memory: &mut [u8], addr: usize, bytes: &[u8]) -> Region {
        memory[addr..addr + bytes.len()].copy_from_slice(bytes);
        Region::new(addr, bytes.len())
    }

    #[test]
    fn regions_outside_memory_are_rejected() {
        let mut bytes = [0u8; 16];
        let memory = Memory::new(&mut bytes);

        assert!(memory.slice(Region::new(8, 8)).is_ok());
        assert_eq!(memory.slice(Region::new(8, 9)), Err(crate::Error::InvalidArgument));
        assert_eq!(
            memory.slice(Region::new(usize::MAX, 2)),
            Err(crate::Error::InvalidArgument)
        );
    }

    #[test]
    fn c_strings_need_a_terminator() {
        let mut bytes = [0u8; 16];
        bytes[..4].copy_from_slice(b"host");
        bytes[4] = 0;
        bytes[5..16].copy_from_slice(b"unterminate");
        let memory = Memory::new(&mut bytes);

        assert_eq!(memory.c_str(0, 255), Ok("host"));
        assert_eq!(memory.c_str(0, 3), Err(crate::Error::InvalidArgument));
        assert_eq!(memory.c_str(5, 255), Err(crate::Error::InvalidArgument));
        assert_eq!(memory.c_str(32, 255), Err(crate::Error::InvalidArgument));
    }

    #[test]
    fn client_id_is_read_as_raw_bytes() {
        let mut bytes = [0xFFu8; 300];
        bytes[..4].copy_from_slice(&[b'i', 0xC3, b'd', 0]);
        let memory = Memory::new(&mut bytes);

        assert_eq!(memory.c_bytes(0, MAX_CLIENT_ID_LEN), Ok(&[b'i', 0xC3, b'd'][..]));
        assert_eq!(memory.c_bytes(4, MAX_CLIENT_ID_LEN).map(<[u8]>::len), Ok(MAX_CLIENT_ID_LEN));
        assert_eq!(memory.c_bytes(290, MAX_CLIENT_ID_LEN).map(<[u8]>::len), Ok(10));
        assert_eq!(memory.c_bytes(400, MAX_CLIENT_ID_LEN), Err(crate::Error::InvalidArgument));
    }

    #[test]
    fn unterminated_binary_client_id_is_truncated() {
        let clock = TestClock::new();
        let mut client: Client<&TestClock, MockTransport> =
            Client::try_new(&clock, MockTransport::new(), Config::default()).unwrap();
        let mut bytes = [0xFEu8; 512];
        place(&mut bytes, 0, b"broker.local\0");
        let mut memory = Memory::new(&mut bytes);

        let connect = Request::Connect {
            hostname: 0,
            client_id: 256,
            port: 1883,
        };
        assert_eq!(dispatch(&mut client, &mut memory, connect), 0);

        client.handle(Event::TransportConnected(1)).unwrap();
        let sent = client.transport().last_sent().unwrap();
        let id = &sent[sent.len() - MAX_CLIENT_ID_LEN - 2..];
        assert_eq!(&id[..2], &[0x00, MAX_CLIENT_ID_LEN as u8]);
        assert!(id[2..].iter().all(|&b| b == 0xFE));
    }

    #[test]
    fn full_session_through_requests() {
        let clock = TestClock::new();
        let mut client: Client<&TestClock, MockTransport> =
            Client::try_new(&clock, MockTransport::new(), Config::default()).unwrap();
        let mut bytes = [0u8; 256];

        place(&mut bytes, 0, b"broker.local\0");
        place(&mut bytes, 32, b"dev\0");
        let topic = place(&mut bytes, 64, b"a/b");
        let payload = place(&mut bytes, 80, b"hi");
        let buffer = Region::new(128, 16);

        let mut memory = Memory::new(&mut bytes);

        let publish = Request::Publish {
            qos: 0,
            retain: false,
            topic,
            payload,
        };
        assert_eq!(dispatch(&mut client, &mut memory, publish), ENOTCONN);

        let connect = Request::Connect {
            hostname: 0,
            client_id: 32,
            port: 1883,
        };
        assert_eq!(dispatch(&mut client, &mut memory, connect), 0);
        assert_eq!(dispatch(&mut client, &mut memory, connect), EBUSY);

        client.handle(Event::TransportConnected(1)).unwrap();
        client
            .handle(Event::DataReceived(1, &[0x20, 0x02, 0x00, 0x00]))
            .unwrap();
        assert_eq!(dispatch(&mut client, &mut memory, Request::Connected), 1);

        assert_eq!(dispatch(&mut client, &mut memory, publish), 0);
        assert_eq!(
            client.transport().last_sent(),
            Some(&[0x30, 0x07, 0x00, 0x03, b'a', b'/', b'b', b'h', b'i'][..])
        );

        client
            .handle(Event::DataReceived(
                1,
                &[0x30, 0x08, 0x00, 0x03, b'a', b'/', b'b', b'x', b'y', b'z'],
            ))
            .unwrap();
        assert_eq!(dispatch(&mut client, &mut memory, Request::Poll), 3);
        assert_eq!(
            dispatch(&mut client, &mut memory, Request::GetTopic { buffer }),
            3
        );
        assert_eq!(memory.slice(Region::new(128, 4)), Ok(&b"a/b\0"[..]));
        assert_eq!(
            dispatch(&mut client, &mut memory, Request::ReadMessage { buffer }),
            3
        );
        assert_eq!(memory.slice(Region::new(128, 3)), Ok(&b"xyz"[..]));
        assert_eq!(dispatch(&mut client, &mut memory, Request::Poll), 0);

        assert_eq!(dispatch(&mut client, &mut memory, Request::Disconnect), 0);
        assert_eq!(dispatch(&mut client, &mut memory, Request::Connected), 0);
        assert_eq!(
            dispatch(&mut client, &mut memory, Request::Disconnect),
            ENOTCONN
        );
    }

    #[test]
    fn invalid_arguments_map_to_einval() {
        let clock = TestClock::new();
        let mut client: Client<&TestClock, MockTransport> =
            Client::try_new(&clock, MockTransport::new(), Config::default()).unwrap();
        let mut bytes = [0u8; 64];
        let topic = place(&mut bytes, 0, b"t");
        let mut memory = Memory::new(&mut bytes);

        let will = Request::SetWill {
            qos: 3,
            retain: false,
            topic,
            payload: topic,
        };
        assert_eq!(dispatch(&mut client, &mut memory, will), EINVAL);

        let auth = Request::SetAuth {
            username: Region::new(60, 8),
            password: topic,
        };
        assert_eq!(dispatch(&mut client, &mut memory, auth), EINVAL);

        let auth = Request::SetAuth {
            username: topic,
            password: Region::new(1, 0),
        };
        assert_eq!(dispatch(&mut client, &mut memory, auth), 0);
    }

    #[test]
    fn errno_mapping() {
        assert_eq!(errno(crate::Error::Busy), EBUSY);
        assert_eq!(errno(crate::Error::OutOfSpace), ENOMEM);
        assert_eq!(errno(crate::Error::InvalidQoS), EINVAL);
        assert_eq!(errno(crate::Error::DnsFailed), EIO);
        assert_eq!(errno(crate::Error::Transport), EIO);
    }
}
