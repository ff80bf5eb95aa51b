//! # Relay Protocol
//!
//! Message framing and validation shared by the three roles of a relay
//! network: a *controller* drives a *toy* through a *proxy*, over TCP or UDP.
//!
//! The crate turns raw socket buffers into validated [`Message`]s and back.
//! Connection lifecycle, channel routing and keepalive scheduling belong to the
//! caller; this crate is what they call with each buffer they read and each
//! message they send.
//!
//! ## Modules
//! - [`core`]: message model, schema validation, frame codec, Tokio codec
//! - [`protocol`]: per-kind dispatch for connection layers
//! - [`config`]: device/transport/logging configuration
//! - [`utils`]: compression, logging setup, metrics
//! - [`error`]: the crate error type
//!
//! ## Example
//! ```rust
//! use relay_protocol::{decode, encode, Message};
//! use serde_json::json;
//!
//! let msg = Message::command(12, json!({"throttle": 0.4}), "toy-7");
//! let bytes = encode(&msg, true)?;
//! assert_eq!(decode(&bytes, true)?, Some(msg));
//!
//! // An empty buffer means the peer went away.
//! assert_eq!(decode(&[], true)?, None);
//! # Ok::<(), relay_protocol::ProtocolError>(())
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod utils;

pub use crate::config::{RelayConfig, Role};
pub use crate::core::codec::RelayCodec;
pub use crate::core::frame::{decode, encode, encode_record, FrameCodec};
pub use crate::core::message::{Message, MessageKind, Record};
pub use crate::error::{ProtocolError, Result};
