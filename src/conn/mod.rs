//! Physical connection handling and per-device connection multiplexing.

mod connection;
mod multiplexer;

pub use connection::{Connection, ConnectionEvent};
pub use multiplexer::Multiplexer;
