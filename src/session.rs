use core::net::IpAddr;

use embedded_time::Instant;
use heapless::Vec;

use crate::{
    buffer,
    config::{MAX_CLIENT_ID_LEN, MAX_PASSWORD_LEN, MAX_PAYLOAD_LEN, MAX_TOPIC_LEN, MAX_USERNAME_LEN},
    incoming::Mailbox,
    packet::{
        Packet, QoS,
        connect::{self, ConnAck, Connect, ConnectReturnCode},
        publish::Publish,
    },
};

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionState {
    Idle,
    ResolvingDns,
    TcpConnecting(Handshake),
    Connected,
    Disconnecting,
}

/// Progress inside [`ConnectionState::TcpConnecting`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Handshake {
    AwaitingTcp,
    AwaitingConnAck,
}

/// What the client has to do after the session processed an inbound packet.
#[derive(Debug, PartialEq)]
pub(crate) enum Action {
    Nothing,
    Connected,
    Reset(crate::Error),
}

pub(crate) struct Will {
    qos: QoS,
    retain: bool,
    topic: Vec<u8, MAX_TOPIC_LEN>,
    payload: Vec<u8, MAX_PAYLOAD_LEN>,
}

pub(crate) struct Credentials {
    username: Vec<u8, MAX_USERNAME_LEN>,
    password: Vec<u8, MAX_PASSWORD_LEN>,
}

/// The one mutable record of the client: who we are, where the broker is and
/// how far the connection got.
pub(crate) struct Session<C: embedded_time::Clock> {
    state: ConnectionState,
    client_id: Vec<u8, MAX_CLIENT_ID_LEN>,
    credentials: Option<Credentials>,
    will: Option<Will>,
    broker_ip: Option<IpAddr>,
    broker_port: u16,
    connect_started: Option<Instant<C>>,
    last_activity: Option<Instant<C>>,
}

impl<C: embedded_time::Clock> Session<C> {
    pub(crate) fn new() -> Self {
        Self {
            state: ConnectionState::Idle,
            client_id: Vec::new(),
            credentials: None,
            will: None,
            broker_ip: None,
            broker_port: 0,
            connect_started: None,
            last_activity: None,
        }
    }

    pub(crate) fn state(&self) -> ConnectionState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: ConnectionState) {
        if self.state != state {
            debug!("session: {:?} -> {:?}", self.state, state);
        }
        self.state = state;
    }

    /// Records a new connection attempt. Empty client identifiers are
    /// replaced by `default_client_id`.
    pub(crate) fn begin(&mut self, client_id: &[u8], default_client_id: &str, port: u16, now: Instant<C>) {
        self.client_id = if client_id.is_empty() {
            buffer::truncated(default_client_id.as_bytes())
        } else {
            buffer::truncated(client_id)
        };
        self.broker_ip = None;
        self.broker_port = port;
        self.connect_started = Some(now);
        self.last_activity = Some(now);
        self.set_state(ConnectionState::ResolvingDns);
    }

    pub(crate) fn set_broker_ip(&mut self, ip: IpAddr) {
        self.broker_ip = Some(ip);
    }

    pub(crate) fn broker(&self) -> Option<(IpAddr, u16)> {
        self.broker_ip.map(|ip| (ip, self.broker_port))
    }

    pub(crate) fn client_id(&self) -> &[u8] {
        &self.client_id
    }

    /// Credentials are only used when the username is not empty.
    pub(crate) fn set_auth(&mut self, username: &[u8], password: &[u8]) {
        self.credentials = if username.is_empty() {
            None
        } else {
            Some(Credentials {
                username: buffer::truncated(username),
                password: buffer::truncated(password),
            })
        };
    }

    pub(crate) fn use_auth(&self) -> bool {
        self.credentials.is_some()
    }

    pub(crate) fn set_will(&mut self, topic: &[u8], payload: &[u8], qos: QoS, retain: bool) {
        self.will = Some(Will {
            qos,
            retain,
            topic: buffer::truncated(topic),
            payload: buffer::truncated(payload),
        });
    }

    pub(crate) fn has_will(&self) -> bool {
        self.will.is_some()
    }

    pub(crate) fn connect_started(&self) -> Option<Instant<C>> {
        self.connect_started
    }

    pub(crate) fn last_activity(&self) -> Option<Instant<C>> {
        self.last_activity
    }

    pub(crate) fn touch(&mut self, now: Instant<C>) {
        self.last_activity = Some(now);
    }

    pub(crate) fn connect_packet(&self, keep_alive: u16) -> Packet<'_> {
        Packet::Connect(Connect {
            clean_session: true,
            keep_alive,
            client_id: &self.client_id,
            will: self.will.as_ref().map(|will| connect::Will {
                qos: will.qos,
                retain: will.retain,
                topic: &will.topic,
                payload: &will.payload,
            }),
            username: self.credentials.as_ref().map(|c| c.username.as_slice()),
            password: self.credentials.as_ref().map(|c| c.password.as_slice()),
        })
    }

    /// Forgets everything tied to the current connection. Client id,
    /// credentials and will stay configured for the next attempt.
    pub(crate) fn teardown(&mut self) {
        self.set_state(ConnectionState::Idle);
        self.broker_ip = None;
        self.broker_port = 0;
        self.connect_started = None;
        self.last_activity = None;
    }

    pub(crate) fn on_packet(&mut self, packet: &Packet, mailbox: &mut Mailbox, now: Instant<C>) -> Action {
        match packet {
            Packet::ConnAck(connack) => self.on_connack(connack, now),
            Packet::Publish(publish) => self.on_publish(publish, mailbox, now),
            Packet::Ack(packet_type) => {
                trace!("session: {:?} received", packet_type);
                self.touch(now);
                Action::Nothing
            }
            Packet::PingResp => {
                trace!("session: PINGRESP received");
                self.touch(now);
                Action::Nothing
            }
            Packet::Ignored(packet_type) => {
                debug!("session: ignoring {:?}", packet_type);
                Action::Nothing
            }
            _ => Action::Nothing,
        }
    }

    fn on_connack(&mut self, packet: &ConnAck, now: Instant<C>) -> Action {
        if self.state != ConnectionState::TcpConnecting(Handshake::AwaitingConnAck) {
            warn!("session: unexpected CONNACK in {:?}", self.state);
            return Action::Nothing;
        }

        if packet.return_code != ConnectReturnCode::Accepted {
            warn!("session: connection refused: {:?}", packet.return_code);
            return Action::Reset(crate::Error::ConnectionRefused);
        }

        info!("session: connected, session present: {}", packet.session_present);
        self.touch(now);
        self.connect_started = None;
        self.set_state(ConnectionState::Connected);

        Action::Connected
    }

    fn on_publish(&mut self, packet: &Publish, mailbox: &mut Mailbox, now: Instant<C>) -> Action {
        if self.state != ConnectionState::Connected {
            warn!("session: PUBLISH before CONNACK ignored");
            return Action::Nothing;
        }

        self.touch(now);

        if mailbox.offer(packet.topic, packet.payload) {
            debug!(
                "session: message stored, topic {} bytes, payload {} bytes",
                packet.topic.len(),
                packet.payload.len()
            );
        } else {
            warn!("session: mailbox occupied, message dropped");
        }

        Action::Nothing
    }
}
