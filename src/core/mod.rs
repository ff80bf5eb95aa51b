//! # Core Protocol Components
//!
//! Message model, schema validation and frame encoding/decoding.
//!
//! ## Components
//! - **Message**: typed message, message kinds, untyped records
//! - **Validator**: required-field checks per message kind
//! - **Frame**: newline framing, optional compression, last-frame recovery
//! - **Codec**: Tokio codec for `Framed` / `UdpFramed` sockets
//!
//! ## Wire Format
//! ```text
//! {"type":"status","seq":12,"data":{...},"uid":"..."}\n
//! ```
//! The whole terminated text is compressed when compression is enabled.

pub mod codec;
pub mod frame;
pub mod message;
pub mod validator;
