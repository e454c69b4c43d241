//! Error types for dustlink.

use std::io;

use thiserror::Error;

/// Result type alias for dustlink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for dustlink.
#[derive(Error, Debug)]
pub enum Error {
    // Codec errors
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    // Protocol-logic errors
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    // Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // General errors
    #[error("internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Payload and value construction errors.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("argument not provided: {0}")]
    ArgumentNotProvided(&'static str),

    #[error("value {value} out of range [{min}, {max}]")]
    OutOfRange { value: i64, min: i64, max: i64 },

    #[error("unknown opcode: {0}")]
    UnknownOpcode(String),

    #[error("not implemented: {0}")]
    NotImplemented(String),

    #[error("inflate failed: {0}")]
    Inflate(String),

    #[error("truncated buffer: needed {needed} bytes, {remaining} left")]
    Truncated { needed: usize, remaining: usize },
}

/// Protocol-logic violations.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("unread bytes on stream: {0} remaining")]
    UnreadBytes(usize),

    #[error("max packet length exceeded: {size} bytes (max {max})")]
    MaxLengthExceeded { size: usize, max: usize },

    #[error("no connection available to send {opcode}")]
    NoConnectionAvailable { opcode: &'static str },

    #[error("timed out waiting for {opcode}")]
    RecvTimeout { opcode: &'static str },

    #[error("connection is not open")]
    ConnectionNotOpen,

    #[error("room connection matrix present without clean plan list")]
    RoomMatrixWithoutPlan,
}

impl Error {
    /// Check if the error is terminal for the connection that produced it.
    /// Codec errors from the framer mean the byte stream itself cannot be
    /// trusted any more, so they close the connection too.
    pub fn closes_connection(&self) -> bool {
        matches!(
            self,
            Error::Io(_)
                | Error::Codec(_)
                | Error::Domain(DomainError::MaxLengthExceeded { .. })
                | Error::Domain(DomainError::UnreadBytes(_))
        )
    }

    /// Check if the error only rejects a single pending exchange.
    pub fn is_request_scoped(&self) -> bool {
        matches!(
            self,
            Error::Domain(DomainError::RecvTimeout { .. })
                | Error::Domain(DomainError::NoConnectionAvailable { .. })
        )
    }
}
