use core::net::IpAddr;

use embedded_time::{Clock, Instant};

use crate::{
    buffer::TxBuffer,
    config::{Config, RX_BUF_SIZE, TX_BUF_SIZE, TX_OVERHEAD},
    incoming::Mailbox,
    keep_alive::{self, KeepAlive},
    packet::{
        Packet, QoS,
        publish::{Flags, Publish},
        subscribe::Subscribe,
        unsubscribe::Unsubscribe,
    },
    packet_id_pool::PacketIdPool,
    parser::RxBuffer,
    protocol::FixedHeader,
    session::{Action, ConnectionState, Handshake, Session},
    transport::{Event, Lookup, Resolve, Transport, TransportError},
};

/// Event driven MQTT 3.1.1 client.
///
/// Host operations ([`connect`](Client::connect), [`publish`](Client::publish),
/// ...) never block: they build at most one packet, hand it to the transport
/// and return. Everything the transport reports back is fed in through
/// [`handle`](Client::handle), together with periodic [`Event::Tick`]s.
pub struct Client<C, T, const TX: usize = TX_BUF_SIZE, const RX: usize = RX_BUF_SIZE>
where
    C: Clock,
    T: Transport,
{
    clock: C,
    transport: T,
    config: Config,
    session: Session<C>,
    link: Option<T::Handle>,
    lookup: Option<Lookup>,
    lookups: u16,
    keep_alive: KeepAlive<C>,
    packet_ids: PacketIdPool,
    tx: TxBuffer<TX>,
    rx: RxBuffer<RX>,
    inbox: Mailbox,
}

impl<C, T, const TX: usize, const RX: usize> Client<C, T, TX, RX>
where
    C: Clock,
    T: Transport,
{
    pub fn try_new(clock: C, transport: T, config: Config) -> Result<Self, crate::Error> {
        let keep_alive = KeepAlive::try_new(&clock, config.keep_alive_secs, config.ping_watchdog)?;

        Ok(Self {
            clock,
            transport,
            config,
            session: Session::new(),
            link: None,
            lookup: None,
            lookups: 0,
            keep_alive,
            packet_ids: PacketIdPool::new(),
            tx: TxBuffer::new(),
            rx: RxBuffer::new(),
            inbox: Mailbox::new(),
        })
    }

    pub fn state(&self) -> ConnectionState {
        self.session.state()
    }

    pub fn connected(&self) -> bool {
        self.session.state() == ConnectionState::Connected
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// The most recently built outbound packet.
    pub fn tx_buffer(&self) -> &TxBuffer<TX> {
        &self.tx
    }

    pub fn rx_buffer(&self) -> &RxBuffer<RX> {
        &self.rx
    }

    pub fn mailbox(&self) -> &Mailbox {
        &self.inbox
    }

    /// Last traffic on the connection in either direction, `None` while idle.
    pub fn last_activity(&self) -> Option<Instant<C>> {
        self.session.last_activity()
    }

    /// Starts resolving `host` and connecting to it. The rest of the handshake
    /// is driven by transport events.
    pub fn connect(&mut self, host: &str, port: u16, client_id: &[u8]) -> Result<(), crate::Error> {
        let state = self.session.state();
        if state != ConnectionState::Idle {
            warn!("client: connect rejected in {:?}", state);
            return Err(crate::Error::Busy);
        }

        if host.is_empty() {
            return Err(crate::Error::InvalidArgument);
        }

        let now = self.now()?;
        self.session
            .begin(client_id, self.config.default_client_id, port, now);
        self.keep_alive.start(now);

        self.lookups = self.lookups.wrapping_add(1);
        let lookup = Lookup(self.lookups);
        self.lookup = Some(lookup);

        info!("client: connecting to {}:{}", host, port);

        match self.transport.resolve(host, lookup) {
            Ok(Resolve::Resolved(addr)) => self.on_dns(lookup, Some(addr)),
            Ok(Resolve::Pending) => Ok(()),
            Err(e) => {
                warn!("client: DNS lookup failed to start: {:?}", e.kind());
                self.reset();
                Err(crate::Error::DnsFailed)
            }
        }
    }

    /// Sends DISCONNECT and tears the link down.
    pub fn disconnect(&mut self) -> Result<(), crate::Error> {
        let link = self.connected_link()?;

        self.session.set_state(ConnectionState::Disconnecting);
        if Self::transmit(&mut self.tx, &mut self.transport, link, &Packet::Disconnect).is_err() {
            warn!("client: DISCONNECT could not be sent");
        }

        info!("client: disconnected");
        self.reset();

        Ok(())
    }

    /// Shutdown path: say goodbye if possible, then reset unconditionally.
    pub fn stop(&mut self) {
        if self.connected() {
            let _ = self.disconnect();
        }

        self.reset();
    }

    pub fn publish(
        &mut self,
        topic: &[u8],
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<(), crate::Error> {
        let link = self.connected_link()?;

        if topic.is_empty() {
            return Err(crate::Error::InvalidArgument);
        }

        if topic.len() + payload.len() + TX_OVERHEAD > TX {
            warn!("client: PUBLISH of {} bytes does not fit", topic.len() + payload.len());
            return Err(crate::Error::OutOfSpace);
        }

        let packet_id = match qos {
            QoS::AtMostOnce => None,
            _ => Some(self.packet_ids.next_id()),
        };

        let packet = Packet::Publish(Publish {
            flags: Flags {
                dup: false,
                qos,
                retain,
            },
            topic,
            packet_id,
            payload,
        });

        Self::transmit(&mut self.tx, &mut self.transport, link, &packet)?;
        self.touch()
    }

    pub fn subscribe(&mut self, topic_filter: &[u8], qos: QoS) -> Result<(), crate::Error> {
        let link = self.connected_link()?;
        Self::check_topic(topic_filter)?;

        let packet = Packet::Subscribe(Subscribe {
            packet_id: self.packet_ids.next_id(),
            topic_filter,
            qos,
        });

        Self::transmit(&mut self.tx, &mut self.transport, link, &packet)?;
        self.touch()
    }

    pub fn unsubscribe(&mut self, topic_filter: &[u8]) -> Result<(), crate::Error> {
        let link = self.connected_link()?;
        Self::check_topic(topic_filter)?;

        let packet = Packet::Unsubscribe(Unsubscribe {
            packet_id: self.packet_ids.next_id(),
            topic_filter,
        });

        Self::transmit(&mut self.tx, &mut self.transport, link, &packet)?;
        self.touch()
    }

    /// Payload length of the pending inbound message, 0 when there is none.
    pub fn poll(&self) -> usize {
        self.inbox.poll()
    }

    pub fn read_message(&mut self, dst: &mut [u8]) -> usize {
        self.inbox.read(dst)
    }

    pub fn get_topic(&self, dst: &mut [u8]) -> usize {
        self.inbox.topic(dst)
    }

    /// Credentials for the next CONNECT. An empty username disables them.
    pub fn set_auth(&mut self, username: &[u8], password: &[u8]) {
        self.session.set_auth(username, password);
    }

    /// Last will for the next CONNECT.
    pub fn set_will(&mut self, topic: &[u8], payload: &[u8], qos: QoS, retain: bool) {
        self.session.set_will(topic, payload, qos, retain);
    }

    pub fn handle(&mut self, event: Event<'_, T::Handle>) -> Result<(), crate::Error> {
        match event {
            Event::Tick => self.on_tick(),
            Event::DnsResolved(lookup, addr) => self.on_dns(lookup, addr),
            Event::TransportConnected(link) => self.on_connected(link),
            Event::DataReceived(link, chunk) => self.on_data(link, chunk),
            Event::SendComplete(link) => {
                if self.link != Some(link) {
                    return Ok(());
                }

                trace!("client: send complete");
                self.touch()
            }
            Event::TransportError(link) => self.on_transport_error(link),
        }
    }

    fn on_dns(&mut self, lookup: Lookup, addr: Option<IpAddr>) -> Result<(), crate::Error> {
        if self.lookup != Some(lookup) || self.session.state() != ConnectionState::ResolvingDns {
            debug!("client: stale DNS answer {} ignored", lookup.id());
            return Ok(());
        }

        self.lookup = None;

        let Some(addr) = addr else {
            warn!("client: DNS lookup failed");
            self.reset();
            return Err(crate::Error::DnsFailed);
        };

        self.session.set_broker_ip(addr);
        self.session
            .set_state(ConnectionState::TcpConnecting(Handshake::AwaitingTcp));

        let Some((addr, port)) = self.session.broker() else {
            self.reset();
            return Err(crate::Error::DnsFailed);
        };

        match self.transport.connect(addr, port) {
            Ok(link) => {
                self.link = Some(link);
                Ok(())
            }
            Err(e) => {
                warn!("client: TCP connect failed: {:?}", e.kind());
                self.reset();
                Err(crate::Error::Transport)
            }
        }
    }

    fn on_connected(&mut self, link: T::Handle) -> Result<(), crate::Error> {
        if self.link != Some(link)
            || self.session.state() != ConnectionState::TcpConnecting(Handshake::AwaitingTcp)
        {
            debug!("client: stale connect event ignored");
            return Ok(());
        }

        debug!(
            "client: sending CONNECT, auth: {}, will: {}",
            self.session.use_auth(),
            self.session.has_will()
        );

        let packet = self.session.connect_packet(self.config.keep_alive_secs);
        let sent = Self::transmit(&mut self.tx, &mut self.transport, link, &packet);

        if let Err(e) = sent {
            warn!("client: CONNECT could not be sent: {:?}", e);
            self.reset();
            return Err(e);
        }

        self.session
            .set_state(ConnectionState::TcpConnecting(Handshake::AwaitingConnAck));

        Ok(())
    }

    fn on_data(&mut self, link: T::Handle, chunk: &[u8]) -> Result<(), crate::Error> {
        if self.link != Some(link) {
            debug!("client: {} bytes from a stale link ignored", chunk.len());
            return Ok(());
        }

        if !self.rx.push(chunk) {
            warn!(
                "client: receive buffer full, {} bytes dropped ({} pending)",
                chunk.len(),
                self.rx.pending()
            );
        }
        self.transport.recved(link, chunk.len());

        let now = self.now()?;
        let mut failure = None;

        loop {
            let frame = match self.rx.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            };

            let Ok(header) = FixedHeader::parse(frame.first_byte, frame.body.len()) else {
                warn!("client: invalid packet type {}", frame.first_byte >> 4);
                continue;
            };

            self.keep_alive.on_receive();
            self.session.touch(now);

            let packet = match Packet::decode(&header, frame.body) {
                Ok(packet) => packet,
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            };

            match self.session.on_packet(&packet, &mut self.inbox, now) {
                Action::Nothing => {}
                Action::Connected => self.keep_alive.start(now),
                Action::Reset(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        if let Some(e) = failure {
            warn!("client: dropping connection: {:?}", e);
            self.reset();
            return Err(e);
        }

        self.rx.compact();

        Ok(())
    }

    fn on_transport_error(&mut self, link: T::Handle) -> Result<(), crate::Error> {
        if self.link != Some(link) {
            return Ok(());
        }

        warn!("client: transport error in {:?}", self.session.state());
        self.reset();

        Err(crate::Error::Transport)
    }

    fn on_tick(&mut self) -> Result<(), crate::Error> {
        let now = self.now()?;

        match self.session.state() {
            ConnectionState::ResolvingDns | ConnectionState::TcpConnecting(_) => {
                self.check_connect_timeout(now)
            }
            ConnectionState::Connected => {
                if self.keep_alive.timed_out(now)? {
                    warn!("client: broker silent after PINGREQ");
                    self.reset();
                    return Err(crate::Error::TimedOut);
                }

                if !self.keep_alive.should_ping(now)? {
                    return Ok(());
                }

                let link = self.connected_link()?;
                Self::transmit(&mut self.tx, &mut self.transport, link, &Packet::PingReq)?;
                self.keep_alive.on_ping(now);
                trace!("client: PINGREQ sent");

                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn check_connect_timeout(&mut self, now: Instant<C>) -> Result<(), crate::Error> {
        if self.config.connect_timeout_secs == 0 {
            return Ok(());
        }

        let Some(started) = self.session.connect_started() else {
            return Ok(());
        };

        let timeout = keep_alive::seconds::<C>(self.config.connect_timeout_secs);
        if keep_alive::elapsed(now, started)? < timeout {
            return Ok(());
        }

        warn!("client: connect timed out in {:?}", self.session.state());
        self.reset();

        Err(crate::Error::TimedOut)
    }

    /// Single teardown path. Safe to call in any state.
    fn reset(&mut self) {
        if let Some(link) = self.link.take() {
            self.transport.close(link);
        }
        self.lookup = None;

        if self.session.state() != ConnectionState::Idle {
            debug!("client: reset from {:?}", self.session.state());
        }

        self.tx.clear();
        self.rx.clear();
        self.inbox.clear();
        self.session.teardown();
    }

    fn connected_link(&self) -> Result<T::Handle, crate::Error> {
        match (self.session.state(), self.link) {
            (ConnectionState::Connected, Some(link)) => Ok(link),
            _ => Err(crate::Error::NotConnected),
        }
    }

    fn check_topic(topic: &[u8]) -> Result<(), crate::Error> {
        if topic.is_empty() {
            return Err(crate::Error::InvalidArgument);
        }

        if topic.len() + TX_OVERHEAD > TX {
            return Err(crate::Error::OutOfSpace);
        }

        Ok(())
    }

    fn transmit(
        tx: &mut TxBuffer<TX>,
        transport: &mut T,
        link: T::Handle,
        packet: &Packet,
    ) -> Result<(), crate::Error> {
        let bytes = tx.build(packet)?;

        transport.send(link, bytes).map_err(|e| {
            warn!("client: send of {} bytes failed: {:?}", bytes.len(), e.kind());
            crate::Error::Transport
        })
    }

    fn touch(&mut self) -> Result<(), crate::Error> {
        let now = self.now()?;
        self.session.touch(now);

        Ok(())
    }

    fn now(&self) -> Result<Instant<C>, crate::Error> {
        self.clock.try_now().map_err(|_| crate::Error::TimeError)
    }
}
