/// Longest client identifier kept by the session, in bytes.
pub const MAX_CLIENT_ID_LEN: usize = 127;
pub const MAX_USERNAME_LEN: usize = 127;
pub const MAX_PASSWORD_LEN: usize = 127;
/// Longest topic kept for the will and for inbound messages.
pub const MAX_TOPIC_LEN: usize = 255;
/// Longest payload kept for the will and for inbound messages.
pub const MAX_PAYLOAD_LEN: usize = 1023;
/// Longest broker hostname read from host memory.
pub const MAX_HOSTNAME_LEN: usize = 255;

/// Address space of the emulated CPU that host requests point into.
pub const HOST_MEMORY_SIZE: usize = 0x1_0000;

/// Default capacity of the outbound packet buffer.
pub const TX_BUF_SIZE: usize = 1024;
/// Default capacity of the receive reassembly buffer.
pub const RX_BUF_SIZE: usize = 2048;

/// Fixed header, remaining length and string prefixes reserved when checking
/// whether an outbound packet fits into the transmit buffer.
pub const TX_OVERHEAD: usize = 10;

/// Runtime knobs of the client.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Keep alive announced in CONNECT. PINGREQ goes out every half interval.
    pub keep_alive_secs: u16,
    /// Upper bound for DNS + TCP + CONNACK. 0 disables the timeout.
    pub connect_timeout_secs: u16,
    /// Reset the link when a PINGREQ is followed by a full keep alive
    /// interval of silence from the broker.
    pub ping_watchdog: bool,
    /// Used when the host connects with an empty client identifier.
    pub default_client_id: &'static str,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keep_alive_secs: 60,
            connect_timeout_secs: 5,
            ping_watchdog: true,
            default_client_id: "rp6502",
        }
    }
}
