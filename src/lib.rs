#![no_std]

#[macro_use]
mod fmt;

pub mod buffer;
pub mod client;
pub mod config;
pub mod host;
pub(crate) mod incoming;
pub(crate) mod keep_alive;
pub mod packet;
pub(crate) mod packet_id_pool;
pub mod parser;
pub mod protocol;
pub(crate) mod session;
#[cfg(test)]
pub(crate) mod testing;
#[cfg(feature = "embassy")]
pub mod time;
pub mod transport;

pub use client::Client;
pub use config::Config;
pub use incoming::Mailbox;
pub use packet::QoS;
pub use session::{ConnectionState, Handshake};
pub use transport::{Event, Lookup, Resolve, Transport};

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A connection attempt is already under way or established.
    Busy,
    NotConnected,
    InvalidArgument,
    InvalidQoS,
    /// The packet does not fit into the transmit buffer.
    OutOfSpace,
    Transport,
    DnsFailed,
    ConnectionRefused,
    TimedOut,
    MalformedPacket,
    MalformedRemainingLength,
    UnexpectedEof,
    InvalidPacketType,
    UnsupportedPacket,
    TimeError,
}
