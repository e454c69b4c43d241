//! Typed payload layer on top of the raw packet bytes.
//!
//! Dispatch is by opcode: a handful of map opcodes use the hand-written
//! binary codecs (zlib-compressed where the firmware compresses), everything
//! else resolves through the protobuf schema registry.

use bytes::Bytes;

use super::schema::{self, Message};
use super::Packet;
use crate::binary::map::{MapInfo, MemoryMapInfo};
use crate::binary::pose::{ChargePose, DevicePose};
use crate::binary::{deflate, inflate, ByteReader, ByteWriter};
use crate::error::{CodecError, DomainError, Result};
use crate::opcode::Opcode;

// Opcodes whose payload is a zlib-compressed map struct.
const MAP_OPCODES: &[&str] = &[
    "DEVICE_MAPID_GET_GLOBAL_INFO_RSP",
    "DEVICE_MAPID_PUSH_MAP_INFO",
    "DEVICE_MAPID_GET_MAP_INFO_RSP",
];

const MEMORY_MAP_OPCODE: &str = "DEVICE_MAPID_PUSH_ALL_MEMORY_MAP_INFO";
const POSE_OPCODE: &str = "DEVICE_MAPID_PUSH_POSITION_INFO";
const CHARGE_POSE_OPCODE: &str = "DEVICE_MAPID_PUSH_CHARGE_POSITION_INFO";

/// Decoded payload value.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadData {
    /// Zero-length payload.
    Empty,
    Pose(DevicePose),
    ChargePose(ChargePose),
    Map(MapInfo),
    MemoryMap(MemoryMapInfo),
    Message(Message),
}

impl From<Message> for PayloadData {
    fn from(message: Message) -> Self {
        PayloadData::Message(message)
    }
}

/// A typed payload with the opcode it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    pub opcode: Opcode,
    pub data: PayloadData,
}

impl Payload {
    pub fn new(opcode: Opcode, data: PayloadData) -> Self {
        Self { opcode, data }
    }

    /// Decode the payload of a framed packet.
    pub fn decode(packet: &Packet) -> Result<Self> {
        Ok(Self {
            opcode: packet.opcode,
            data: PayloadCodec::decode(packet.opcode, &packet.payload)?,
        })
    }

    /// Serialize back to raw payload bytes.
    pub fn encode(&self) -> Result<Bytes> {
        PayloadCodec::encode(self.opcode, &self.data)
    }
}

/// Stateless opcode-driven payload codec.
pub struct PayloadCodec;

impl PayloadCodec {
    pub fn decode(opcode: Opcode, payload: &[u8]) -> Result<PayloadData> {
        let name = opcode.name();

        if MAP_OPCODES.contains(&name) {
            let raw = inflate(payload)?;
            return Ok(PayloadData::Map(MapInfo::decode(&raw)?));
        }
        if name == MEMORY_MAP_OPCODE {
            let raw = inflate(payload)?;
            return Ok(PayloadData::MemoryMap(MemoryMapInfo::decode(&raw)?));
        }
        if name == POSE_OPCODE {
            let mut reader = ByteReader::new(payload);
            let pose = DevicePose::decode(&mut reader)?;
            reject_trailing(&reader)?;
            return Ok(PayloadData::Pose(pose));
        }
        if name == CHARGE_POSE_OPCODE {
            let mut reader = ByteReader::new(payload);
            let pose = ChargePose::decode(&mut reader)?;
            reject_trailing(&reader)?;
            return Ok(PayloadData::ChargePose(pose));
        }

        if !schema::has_schema(name) {
            return Err(CodecError::NotImplemented(format!("no payload codec for {opcode}")).into());
        }
        if payload.is_empty() {
            return Ok(PayloadData::Empty);
        }
        let message = schema::decode_message(opcode, payload)?
            .ok_or(CodecError::ArgumentNotProvided("schema message"))?;
        Ok(PayloadData::Message(message))
    }

    pub fn encode(opcode: Opcode, data: &PayloadData) -> Result<Bytes> {
        let name = opcode.name();
        match data {
            PayloadData::Empty => Ok(Bytes::new()),
            PayloadData::Map(map) => {
                if !MAP_OPCODES.contains(&name) {
                    return Err(variant_mismatch(opcode, "map"));
                }
                Ok(deflate(&map.encode()?)?.into())
            }
            PayloadData::MemoryMap(archive) => {
                if name != MEMORY_MAP_OPCODE {
                    return Err(variant_mismatch(opcode, "stored map archive"));
                }
                Ok(deflate(&archive.encode()?)?.into())
            }
            PayloadData::Pose(pose) => {
                if name != POSE_OPCODE {
                    return Err(variant_mismatch(opcode, "robot pose"));
                }
                let mut writer = ByteWriter::new();
                pose.encode(&mut writer);
                Ok(writer.into_vec().into())
            }
            PayloadData::ChargePose(pose) => {
                if name != CHARGE_POSE_OPCODE {
                    return Err(variant_mismatch(opcode, "charger pose"));
                }
                let mut writer = ByteWriter::new();
                pose.encode(&mut writer);
                Ok(writer.into_vec().into())
            }
            PayloadData::Message(message) => Ok(schema::encode_message(opcode, message)?.into()),
        }
    }
}

fn reject_trailing(reader: &ByteReader<'_>) -> Result<()> {
    if reader.remaining() != 0 {
        return Err(DomainError::UnreadBytes(reader.remaining()).into());
    }
    Ok(())
}

fn variant_mismatch(opcode: Opcode, what: &str) -> crate::error::Error {
    CodecError::InvalidArgument(format!("{what} payload not valid for {opcode}")).into()
}
