use core::{cell::Cell, net::IpAddr};

use embedded_time::{Clock, Instant, clock, rate::Fraction};
use heapless::Vec;

use crate::transport::{ErrorKind, ErrorType, Lookup, Resolve, Transport};

/// Millisecond clock that only moves when told to.
#[derive(Debug)]
pub(crate) struct TestClock {
    now: Cell<u64>,
}

impl TestClock {
    pub(crate) fn new() -> Self {
        Self { now: Cell::new(0) }
    }

    pub(crate) fn advance_ms(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    pub(crate) fn now(&self) -> Instant<Self> {
        Instant::new(self.now.get())
    }
}

impl Clock for TestClock {
    type T = u64;

    const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000);

    fn try_now(&self) -> Result<Instant<Self>, clock::Error> {
        Ok(Instant::new(self.now.get()))
    }
}

impl<'a> Clock for &'a TestClock {
    type T = u64;

    const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000);

    fn try_now(&self) -> Result<Instant<Self>, clock::Error> {
        Ok(Instant::new(self.now.get()))
    }
}

/// Tick count of an instant, for comparing readings of different clock types.
pub(crate) fn ticks<C: Clock<T = u64>>(instant: Instant<C>) -> u64 {
    instant.duration_since_epoch().integer()
}

pub(crate) type Frame = Vec<u8, 1100>;

/// Scripted transport recording everything the client asks of it.
pub(crate) struct MockTransport {
    pub(crate) dns: Option<Resolve>,
    pub(crate) refuse_connect: bool,
    pub(crate) fail_send: bool,
    pub(crate) handle: u8,
    pub(crate) resolved: Vec<u8, 255>,
    pub(crate) lookup: Option<Lookup>,
    pub(crate) connected_to: Option<(IpAddr, u16)>,
    pub(crate) sent: Vec<Frame, 16>,
    pub(crate) recved: usize,
    pub(crate) closed: Vec<u8, 8>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self {
            dns: Some(Resolve::Resolved(IpAddr::from([192, 168, 1, 10]))),
            refuse_connect: false,
            fail_send: false,
            handle: 1,
            resolved: Vec::new(),
            lookup: None,
            connected_to: None,
            sent: Vec::new(),
            recved: 0,
            closed: Vec::new(),
        }
    }

    /// Tag of the most recent lookup, for answering it with an event.
    pub(crate) fn pending_lookup(&self) -> Lookup {
        self.lookup.unwrap_or(Lookup(0))
    }

    pub(crate) fn last_sent(&self) -> Option<&[u8]> {
        self.sent.last().map(|frame| frame.as_slice())
    }
}

impl ErrorType for MockTransport {
    type Error = ErrorKind;
}

impl Transport for MockTransport {
    type Handle = u8;

    fn resolve(&mut self, host: &str, lookup: Lookup) -> Result<Resolve, Self::Error> {
        self.lookup = Some(lookup);
        self.resolved.clear();
        self.resolved
            .extend_from_slice(host.as_bytes())
            .map_err(|_| ErrorKind::OutOfMemory)?;

        self.dns.ok_or(ErrorKind::NotFound)
    }

    fn connect(&mut self, addr: IpAddr, port: u16) -> Result<Self::Handle, Self::Error> {
        if self.refuse_connect {
            return Err(ErrorKind::ConnectionRefused);
        }

        self.connected_to = Some((addr, port));
        Ok(self.handle)
    }

    fn send(&mut self, _link: Self::Handle, bytes: &[u8]) -> Result<(), Self::Error> {
        if self.fail_send {
            return Err(ErrorKind::BrokenPipe);
        }

        let frame = Frame::from_slice(bytes).map_err(|_| ErrorKind::OutOfMemory)?;
        self.sent.push(frame).map_err(|_| ErrorKind::OutOfMemory)
    }

    fn recved(&mut self, _link: Self::Handle, len: usize) {
        self.recved += len;
    }

    fn close(&mut self, link: Self::Handle) {
        let _ = self.closed.push(link);
    }
}
