//! Outgoing packet records used for round-trip estimation.

use wire::PING_UNKNOWN;

use crate::ring::Ring;

/// When a client packet was sent, in both clocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutgoingPacket {
    /// Server time the client had reached when it sent the packet.
    pub server_time: i32,
    /// Local clock at send time.
    pub realtime: i32,
}

/// The most recent outgoing packets.
#[derive(Debug, Clone)]
pub struct OutgoingPackets {
    ring: Ring<OutgoingPacket>,
    sent: u64,
}

impl OutgoingPackets {
    /// Creates an empty record window.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: Ring::new(capacity),
            sent: 0,
        }
    }

    /// Number of packets ever recorded.
    #[must_use]
    pub const fn sent(&self) -> u64 {
        self.sent
    }

    /// Records a sent packet.
    pub fn record(&mut self, packet: OutgoingPacket) {
        *self.ring.get_mut(self.sent) = packet;
        self.sent += 1;
    }

    /// Round-trip time for a snapshot whose player state reflects input up to
    /// `command_time`.
    ///
    /// Scans from the most recent packet backwards for the first one the
    /// server had already processed when it built the snapshot.
    #[must_use]
    pub fn ping(&self, command_time: i32, realtime: i32) -> i32 {
        let window = self.sent.min(self.ring.capacity() as u64);
        (1..=window)
            .map(|back| self.ring.get(self.sent - back))
            .find(|packet| command_time >= packet.server_time)
            .map_or(PING_UNKNOWN, |packet| realtime.wrapping_sub(packet.realtime))
    }
}
