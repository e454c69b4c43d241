//! Packet header codec and constructors.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use super::{CTYPE_COMMAND, HEADER_SIZE, MAX_PACKET_SIZE};
use crate::binary::ByteReader;
use crate::error::{CodecError, DomainError, Result};
use crate::opcode::Opcode;
use crate::types::{DeviceId, PacketSequence, UserId};

/// One framed protocol packet. The payload is kept as raw bytes here;
/// [`PayloadCodec`](super::PayloadCodec) turns it into typed data.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    pub ctype: u8,
    pub flow: u8,
    pub device_id: DeviceId,
    pub user_id: UserId,
    pub sequence: PacketSequence,
    pub opcode: Opcode,
    pub payload: Bytes,
}

impl Packet {
    /// Build a fresh outbound request with a random sequence.
    pub fn request(
        opcode: Opcode,
        device_id: DeviceId,
        user_id: UserId,
        payload: Bytes,
    ) -> Self {
        Self {
            ctype: CTYPE_COMMAND,
            flow: 0,
            device_id,
            user_id,
            sequence: PacketSequence::generate(),
            opcode,
            payload,
        }
    }

    /// Build the reply to `request`: same ctype and sequence, flow bumped,
    /// source ids swapped back. Every packet crosses the device and user
    /// slots relative to its sender, replies included.
    pub fn respond_to(request: &Packet, opcode: Opcode, payload: Bytes) -> Self {
        Self {
            ctype: request.ctype,
            flow: request.flow.wrapping_add(1),
            device_id: DeviceId(request.user_id.0),
            user_id: UserId(request.device_id.0),
            sequence: request.sequence,
            opcode,
            payload,
        }
    }

    /// Total on-wire size, header included.
    pub fn total_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// Serialize into `dst`.
    pub fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        let total = self.total_size();
        if total > MAX_PACKET_SIZE {
            return Err(DomainError::MaxLengthExceeded {
                size: total,
                max: MAX_PACKET_SIZE,
            }
            .into());
        }

        dst.reserve(total);
        dst.put_u32_le(total as u32);
        dst.put_u8(self.ctype);
        dst.put_u8(self.flow);
        dst.put_u32_le(self.device_id.0);
        dst.put_u32_le(self.user_id.0);
        dst.put_u64_le(self.sequence.0);
        dst.put_u16_le(self.opcode.code());
        dst.put_slice(&self.payload);
        Ok(())
    }

    /// Parse one complete frame. `buf` must hold exactly the bytes the
    /// leading total-size field announces; the framer guarantees this.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(buf);
        let total = reader.read_u32()? as usize;
        if total != buf.len() {
            return Err(CodecError::InvalidArgument(format!(
                "frame is {} bytes but header says {total}",
                buf.len()
            ))
            .into());
        }

        let ctype = reader.read_u8()?;
        let flow = reader.read_u8()?;
        let device_id = DeviceId(reader.read_u32()?);
        let user_id = UserId(reader.read_u32()?);
        let sequence = PacketSequence(reader.read_u64()?);
        let opcode = Opcode::from_code(u32::from(reader.read_u16()?))?;
        let payload = Bytes::copy_from_slice(&buf[HEADER_SIZE..]);

        Ok(Self {
            ctype,
            flow,
            device_id,
            user_id,
            sequence,
            opcode,
            payload,
        })
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} seq={} dev={} user={} flow={} len={}",
            self.opcode,
            self.sequence,
            self.device_id,
            self.user_id,
            self.flow,
            self.payload.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A complete DEVICE_GETTIME_RSP frame captured from a live device.
    const GETTIME_FRAME: &str =
        "2500000002010100000002000000128c97bb0f9a477a121008001a090893afeefd0510901c";

    #[test]
    fn test_decode_matches_wire_capture() {
        let raw = hex::decode(GETTIME_FRAME).unwrap();
        let packet = Packet::decode(&raw).unwrap();

        assert_eq!(packet.ctype, 2);
        assert_eq!(packet.flow, 1);
        assert_eq!(packet.device_id, DeviceId(1));
        assert_eq!(packet.user_id, UserId(2));
        assert_eq!(packet.sequence, PacketSequence(0x7a47_9a0f_bb97_8c12));
        assert_eq!(packet.opcode.name(), "DEVICE_GETTIME_RSP");
        assert_eq!(packet.payload.len(), 13);
        assert_eq!(packet.total_size(), 37);
    }

    #[test]
    fn test_encode_matches_wire_capture() {
        let raw = hex::decode(GETTIME_FRAME).unwrap();
        let packet = Packet::decode(&raw).unwrap();

        let mut buf = BytesMut::new();
        packet.encode(&mut buf).unwrap();
        assert_eq!(&buf[..], &raw[..]);
    }

    #[test]
    fn test_size_mismatch_rejected() {
        let mut raw = hex::decode(GETTIME_FRAME).unwrap();
        raw.push(0x00);
        assert!(Packet::decode(&raw).is_err());
    }

    #[test]
    fn test_oversize_payload_rejected_on_encode() {
        let packet = Packet::request(
            Opcode::from_name("DEVICE_MAPID_PUSH_MAP_INFO").unwrap(),
            DeviceId(1),
            UserId(2),
            vec![0u8; MAX_PACKET_SIZE].into(),
        );
        let mut buf = BytesMut::new();
        assert!(packet.encode(&mut buf).is_err());
    }

    #[test]
    fn test_respond_copies_correlation_and_swaps_ids() {
        let raw = hex::decode(GETTIME_FRAME).unwrap();
        let request = Packet::decode(&raw).unwrap();
        assert_eq!(request.device_id, DeviceId(1));
        assert_eq!(request.user_id, UserId(2));

        let reply = Packet::respond_to(
            &request,
            Opcode::from_name("DEVICE_GETTIME_REQ").unwrap(),
            Bytes::new(),
        );

        assert_eq!(reply.sequence, request.sequence);
        assert_eq!(reply.ctype, request.ctype);
        assert_eq!(reply.flow, request.flow + 1);
        assert_eq!(reply.device_id, DeviceId(2));
        assert_eq!(reply.user_id, UserId(1));
    }
}
