//! # Dustlink
//!
//! Cloud endpoint for a family of robot vacuums that speak a proprietary
//! binary protocol over plain TCP.
//!
//! ## Architecture
//!
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Packet Server (3 ports)                    │
//! │        cmd :4010          map :4030          time :4050         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                     Device Session Registry                     │
//! │  ┌───────────────────────────────────────────────────────────┐  │
//! │  │  Session: handshake, pending replies, device state        │  │
//! │  │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐     │  │
//! │  │  │ Connection 1 │  │ Connection 2 │  │ Connection N │     │  │
//! │  │  └──────────────┘  └──────────────┘  └──────────────┘     │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! ├─────────────────────────────────────────────────────────────────┤
//! │          Payload Codec (protobuf schemas / binary maps)         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                Packet Framer (length-prefixed, LE)              │
//! └─────────────────────────────────────────────────────────────────┘

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Allow stylistic lints that don't affect correctness
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_const_for_fn)] // Many functions can't be const due to trait bounds
#![allow(clippy::doc_markdown)] // ASCII diagrams in docs
#![allow(clippy::unreadable_literal)] // Wire constants read better unbroken
#![allow(clippy::cast_possible_truncation)] // Sizes are checked before narrowing
#![allow(clippy::option_if_let_else)] // More readable in context
#![allow(clippy::use_self)] // Explicit type names in matches
#![allow(clippy::cognitive_complexity)] // Protocol state machines
#![allow(clippy::too_many_lines)] // Complete implementations
#![allow(clippy::future_not_send)] // Async internals
#![allow(clippy::match_same_arms)] // Explicit arm per variant is clearer
#![allow(clippy::ignored_unit_patterns)] // Ok(_) vs Ok(()) is stylistic

pub mod binary;
pub mod config;
pub mod conn;
pub mod error;
pub mod opcode;
pub mod protocol;
pub mod server;
pub mod session;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::conn::{Connection, Multiplexer};
    pub use crate::error::{Error, Result};
    pub use crate::opcode::Opcode;
    pub use crate::protocol::{Packet, PacketCodec, Payload, PayloadData};
    pub use crate::server::{PacketServer, ServerHandle};
    pub use crate::session::{Session, SessionState};
    pub use crate::types::*;
}
