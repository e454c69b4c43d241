//! Wire protocol for dustlink.
//!
//! Defines the packet framing, the payload codec and the message schemas.
//!
//! ## Packet Format
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │ Total Size (4) │ CType (1) │ Flow (1) │ Device ID (4) │ User ID (4) │
//! ├──────────────────────────────────────────────────────────────────┤
//! │           Sequence (8)           │ Opcode (2) │ Payload ...      │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All header fields are little-endian. `Total Size` includes the 24-byte
//! header. Payloads are either protobuf messages (schema keyed by opcode) or
//! zlib-compressed hand-written binary structures.

mod codec;
mod packet;
mod payload;
pub mod schema;

pub use codec::PacketCodec;
pub use packet::Packet;
pub use payload::{Payload, PayloadCodec, PayloadData};

/// Header size in bytes.
pub const HEADER_SIZE: usize = 24;

/// Maximum total packet size (header included).
pub const MAX_PACKET_SIZE: usize = 1 << 20;

/// CType used for all request/reply traffic.
pub const CTYPE_COMMAND: u8 = 2;
