//! Core types used throughout dustlink.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Identifier assigned to a device at registration. Zero means unregistered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DeviceId(pub u32);

impl DeviceId {
    /// The unregistered sentinel.
    pub const UNREGISTERED: Self = Self(0);

    pub fn is_registered(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the user a device is paired with. Zero means broadcast/unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct UserId(pub u32);

impl UserId {
    pub fn is_set(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Correlates a request with its reply. Generated randomly for new outbound
/// requests, copied unchanged from request to reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PacketSequence(pub u64);

impl PacketSequence {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Generate a fresh random sequence for an outbound request.
    pub fn generate() -> Self {
        Self(rand::random())
    }
}

impl fmt::Display for PacketSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Process-local identifier for one physical connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

impl ConnectionId {
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_display_is_16_hex_digits() {
        let seq = PacketSequence(0x7a47_9a0f_bb97_8c12);
        assert_eq!(seq.to_string(), "7a479a0fbb978c12");

        let seq = PacketSequence(0x1);
        assert_eq!(seq.to_string(), "0000000000000001");
    }

    #[test]
    fn test_generated_sequences_differ() {
        // Random u64 collisions are not a practical concern here.
        assert_ne!(PacketSequence::generate(), PacketSequence::generate());
    }

    #[test]
    fn test_connection_ids_monotonic() {
        let a = ConnectionId::next();
        let b = ConnectionId::next();
        assert!(b.0 > a.0);
    }

    #[test]
    fn test_device_id_registration() {
        assert!(!DeviceId::UNREGISTERED.is_registered());
        assert!(DeviceId(7).is_registered());
    }
}
