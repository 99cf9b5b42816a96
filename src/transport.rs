use core::net::IpAddr;

pub use embedded_io_async::{Error as TransportError, ErrorKind, ErrorType};

/// Tags one name lookup. [`Event::DnsResolved`] must carry the tag the
/// lookup was started with, answers for abandoned lookups are dropped.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Lookup(pub(crate) u16);

impl Lookup {
    pub fn id(&self) -> u16 {
        self.0
    }
}

/// Outcome of a name lookup.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Resolve {
    Resolved(IpAddr),
    /// The answer arrives later as [`Event::DnsResolved`].
    Pending,
}

/// Non-blocking TCP stack the client drives.
///
/// Every call returns immediately. Completions are reported back through
/// [`Client::handle`](crate::Client::handle) as [`Event`]s tagged with the
/// link handle returned by [`Transport::connect`].
pub trait Transport: ErrorType {
    type Handle: Copy + PartialEq + core::fmt::Debug;

    fn resolve(&mut self, host: &str, lookup: Lookup) -> Result<Resolve, Self::Error>;

    fn connect(&mut self, addr: IpAddr, port: u16) -> Result<Self::Handle, Self::Error>;

    fn send(&mut self, link: Self::Handle, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Tells the stack that `len` received bytes were consumed.
    fn recved(&mut self, _link: Self::Handle, _len: usize) {}

    fn close(&mut self, link: Self::Handle);
}

/// Something that happened since the last call into the client.
#[derive(Debug)]
pub enum Event<'a, H> {
    /// Periodic wake up driving timeouts and keep alive.
    Tick,
    /// `None` when the lookup failed.
    DnsResolved(Lookup, Option<IpAddr>),
    TransportConnected(H),
    DataReceived(H, &'a [u8]),
    SendComplete(H),
    TransportError(H),
}
