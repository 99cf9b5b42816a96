use heapless::Vec;

use crate::{
    buffer,
    config::{MAX_PAYLOAD_LEN, MAX_TOPIC_LEN},
};

/// Single slot holding the most recent inbound PUBLISH until the host reads
/// it.
pub struct Mailbox {
    topic: Vec<u8, MAX_TOPIC_LEN>,
    payload: Vec<u8, MAX_PAYLOAD_LEN>,
    available: bool,
    dropped: usize,
}

impl Mailbox {
    pub const fn new() -> Self {
        Self {
            topic: Vec::new(),
            payload: Vec::new(),
            available: false,
            dropped: 0,
        }
    }

    /// Stores a message unless the previous one has not been read yet.
    /// Oversized topics and payloads are truncated.
    pub(crate) fn offer(&mut self, topic: &[u8], payload: &[u8]) -> bool {
        if self.available {
            self.dropped = self.dropped.saturating_add(1);
            return false;
        }

        self.topic = buffer::truncated(topic);
        self.payload = buffer::truncated(payload);
        self.available = true;

        true
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Payload length of the pending message, 0 when there is none.
    pub fn poll(&self) -> usize {
        if self.available { self.payload.len() } else { 0 }
    }

    /// Copies the pending payload into `dst`, truncating to its length, and
    /// frees the slot.
    pub fn read(&mut self, dst: &mut [u8]) -> usize {
        if !self.available {
            return 0;
        }

        let len = buffer::copy_truncated(&self.payload, dst);
        self.available = false;

        len
    }

    /// Copies the topic of the last stored message. A terminating NUL is
    /// appended when `dst` has room for it. The slot stays occupied.
    pub fn topic(&self, dst: &mut [u8]) -> usize {
        if self.topic.is_empty() {
            return 0;
        }

        let len = buffer::copy_truncated(&self.topic, dst);

        if len < dst.len() {
            dst[len] = 0;
        }

        len
    }

    /// Messages dropped because the slot was still occupied.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub(crate) fn clear(&mut self) {
        self.topic.clear();
        self.payload.clear();
        self.available = false;
    }
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}
