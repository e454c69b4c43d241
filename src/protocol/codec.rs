//! Streaming packet framer for use with `tokio_util::codec::Framed`.

use byteorder::{ByteOrder, LittleEndian};
use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use super::{Packet, HEADER_SIZE, MAX_PACKET_SIZE};
use crate::error::{CodecError, DomainError, Error};

/// Length-prefixed framer. Waits for the full frame announced by the leading
/// total-size field, and rejects absurd lengths as soon as the prefix is
/// readable so a hostile peer cannot make us buffer unbounded data.
#[derive(Debug, Default)]
pub struct PacketCodec;

impl Decoder for PacketCodec {
    type Item = Packet;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>, Error> {
        if src.len() < 4 {
            return Ok(None);
        }

        let total = LittleEndian::read_u32(&src[..4]) as usize;
        if total > MAX_PACKET_SIZE {
            return Err(DomainError::MaxLengthExceeded {
                size: total,
                max: MAX_PACKET_SIZE,
            }
            .into());
        }
        if total < HEADER_SIZE {
            return Err(CodecError::InvalidArgument(format!(
                "frame length {total} below header size"
            ))
            .into());
        }

        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        let frame = src.split_to(total);
        Packet::decode(&frame).map(Some)
    }
}

impl Encoder<Packet> for PacketCodec {
    type Error = Error;

    fn encode(&mut self, packet: Packet, dst: &mut BytesMut) -> Result<(), Error> {
        packet.encode(dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GETTIME_FRAME: &str =
        "2500000002010100000002000000128c97bb0f9a477a121008001a090893afeefd0510901c";

    #[test]
    fn test_decode_across_chunks() {
        let raw = hex::decode(GETTIME_FRAME).unwrap();
        let mut codec = PacketCodec;
        let mut buf = BytesMut::new();

        // Drip the frame in three pieces.
        buf.extend_from_slice(&raw[..3]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(&raw[3..20]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(&raw[20..]);
        let packet = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(packet.opcode.name(), "DEVICE_GETTIME_RSP");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_back_to_back_frames() {
        let raw = hex::decode(GETTIME_FRAME).unwrap();
        let mut codec = PacketCodec;
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&raw);
        buf.extend_from_slice(&raw);

        assert!(codec.decode(&mut buf).unwrap().is_some());
        assert!(codec.decode(&mut buf).unwrap().is_some());
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_oversize_rejected_from_prefix_alone() {
        let mut codec = PacketCodec;
        let mut buf = BytesMut::from(&(MAX_PACKET_SIZE as u32 + 1).to_le_bytes()[..]);
        let err = codec.decode(&mut buf).unwrap_err();
        assert!(matches!(
            err,
            Error::Domain(DomainError::MaxLengthExceeded { .. })
        ));
    }

    #[test]
    fn test_runt_frame_rejected() {
        let mut codec = PacketCodec;
        let mut buf = BytesMut::from(&8u32.to_le_bytes()[..]);
        assert!(codec.decode(&mut buf).is_err());
    }

    #[test]
    fn test_encode_then_decode() {
        let raw = hex::decode(GETTIME_FRAME).unwrap();
        let packet = Packet::decode(&raw).unwrap();

        let mut codec = PacketCodec;
        let mut buf = BytesMut::new();
        codec.encode(packet.clone(), &mut buf).unwrap();
        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, packet);
    }
}
