//! # Error Types
//!
//! Error handling for the relay protocol.
//!
//! Every fallible operation in this crate returns [`Result`], whose error type is
//! [`ProtocolError`].
//!
//! ## Error Categories
//! - **Framing Errors**: malformed compressed payloads, invalid JSON, non-object frames
//! - **Validation Errors**: unknown message kinds, missing or mistyped fields
//! - **Compression Errors**: compressor failures, decompression size limit violations
//! - **Configuration Errors**: unreadable or invalid configuration
//!
//! A zero-length inbound buffer is not an error. [`decode`](crate::core::frame::decode)
//! reports it as `Ok(None)` so callers can tell a closed peer apart from bad data.
//!
//! ## Example Usage
//! ```rust
//! use relay_protocol::core::frame::decode;
//! use relay_protocol::error::ProtocolError;
//!
//! match decode(b"{\"type\":\"ping\",\"seq\":1,\"data\":null}\n", false) {
//!     Err(ProtocolError::MissingField(field)) => assert_eq!(field, "uid"),
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

use crate::core::message::MessageKind;
use std::io;
use thiserror::Error;

/// Error message constants shared by the error paths.
pub mod constants {
    pub const ERR_DISPATCHER_WRITE_LOCK: &str = "Failed to acquire write lock on dispatcher";
    pub const ERR_DISPATCHER_READ_LOCK: &str = "Failed to acquire read lock on dispatcher";

    pub const ERR_MISSING_TYPE: &str = "<missing>";
    pub const ERR_DECOMPRESSED_NOT_UTF8: &str = "decompressed payload is not valid UTF-8";
    pub const ERR_DECOMPRESSION_LIMIT: &str = "decompressed payload exceeds size limit";
}

/// Underlying reason a frame could not be turned into JSON.
#[derive(Error, Debug)]
pub enum DecodeCause {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("decompression failed: {0}")]
    Decompression(String),
}

// ProtocolError is the primary error type for all protocol operations
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Error parsing incoming message: {source}; raw payload: {raw:?}")]
    Decode {
        #[source]
        source: DecodeCause,
        raw: String,
    },

    #[error("Frame too large: {0} bytes")]
    OversizedFrame(usize),

    #[error("The incoming message is corrupt")]
    CorruptMessage,

    #[error("Unknown message type: {0}")]
    UnknownType(String),

    #[error("Message is missing required field: {0}")]
    MissingField(&'static str),

    #[error("Field `{field}` has the wrong type (expected {expected})")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Compression failed")]
    CompressionFailure,

    #[error("Decompression failed: {0}")]
    DecompressionFailure(&'static str),

    #[error("No handler registered for message type: {0}")]
    NoHandler(MessageKind),

    #[error("Synchronization primitive poisoned: {0}")]
    LockPoisoned(&'static str),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ProtocolError {
    /// Whether the error came from the message schema rather than the framing.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ProtocolError::UnknownType(_)
                | ProtocolError::MissingField(_)
                | ProtocolError::InvalidField { .. }
        )
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
