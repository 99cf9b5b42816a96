use crate::packet::PacketId;

/// Hands out packet identifiers for PUBLISH (QoS > 0), SUBSCRIBE and
/// UNSUBSCRIBE.
///
/// Identifiers are not correlated with their acknowledgments; the counter
/// just moves forward, skipping 0.
#[derive(Debug)]
pub(crate) struct PacketIdPool {
    next_id: u16,
}

impl PacketIdPool {
    pub(crate) const fn new() -> Self {
        Self { next_id: 1 }
    }

    pub(crate) fn next_id(&mut self) -> PacketId {
        self.next_id = self.next_id.wrapping_add(1);

        if self.next_id == 0 {
            self.next_id = 1;
        }

        PacketId(self.next_id)
    }
}
