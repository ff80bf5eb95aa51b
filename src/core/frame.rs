//! # Frame Codec
//!
//! Turns messages into newline-terminated, optionally compressed byte buffers
//! and back.
//!
//! ## Encode
//! Only `type`, `seq`, `data`, `uid` and a `true` `sticky` are written. Anything
//! else on the input is dropped. The JSON text gets exactly one `\n` appended and
//! is then passed through the [`Compressor`] when compression is enabled.
//! Encode does not validate.
//!
//! ## Decode
//! A zero-length buffer means the peer closed the connection and decodes to
//! `Ok(None)`. Otherwise the buffer is decompressed (or read as UTF-8), the
//! last complete frame is selected, parsed as JSON, required to be an object
//! and validated against the schema of its `type`.
//!
//! ## Coalesced buffers
//! Transports may deliver several writes in one buffer. Only the last frame of
//! a buffer is decoded and the earlier ones are dropped. Peers depend on this
//! policy, so it is kept as is. [`FrameCodec::decode_detailed`] reports how many
//! frames were dropped.
//!
//! All functions here are pure: no I/O, no shared state, no logging.

use crate::core::message::{
    Message, MessageKind, Record, FIELD_DATA, FIELD_SEQ, FIELD_STICKY, FIELD_TYPE, FIELD_UID,
};
use crate::core::validator;
use crate::error::{DecodeCause, ProtocolError, Result};
use crate::utils::compression::{CompressionKind, Compressor};
use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;

/// Frame terminator.
pub const FRAME_DELIMITER: char = '\n';

/// Outgoing frame built from a typed message.
#[derive(Serialize)]
struct WireMessage<'a> {
    #[serde(rename = "type")]
    kind: MessageKind,
    seq: i64,
    data: &'a Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    uid: Option<&'a str>,
    #[serde(skip_serializing_if = "is_false")]
    sticky: bool,
}

/// Outgoing frame built from an unchecked record. Absent keys stay absent.
#[derive(Serialize)]
struct WireRecord<'a> {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seq: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    uid: Option<&'a Value>,
    #[serde(skip_serializing_if = "is_false")]
    sticky: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A decoded message plus what the frame recovery policy threw away.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub message: Message,
    /// Complete or partial frames that preceded the decoded one in the buffer.
    pub discarded_frames: usize,
}

/// Stateless encoder/decoder for relay frames.
#[derive(Debug, Clone, Default)]
pub struct FrameCodec<C = CompressionKind> {
    compressor: C,
}

impl<C: Compressor> FrameCodec<C> {
    pub fn new(compressor: C) -> Self {
        Self { compressor }
    }

    pub fn compressor(&self) -> &C {
        &self.compressor
    }

    /// Serialize a message into a terminated, optionally compressed frame.
    ///
    /// Extra fields on the message are not written.
    ///
    /// # Errors
    /// Returns `ProtocolError::CompressionFailure` if the compressor fails
    pub fn encode(&self, message: &Message, compressed: bool) -> Result<Vec<u8>> {
        let wire = WireMessage {
            kind: message.kind(),
            seq: message.seq(),
            data: message.data(),
            uid: message.uid(),
            sticky: message.is_sticky(),
        };
        self.frame(&wire, compressed)
    }

    /// Serialize a loose message-like record, copying only the wire fields.
    ///
    /// No validation happens here: a record missing `uid` or carrying an
    /// unknown `type` is framed as given.
    pub fn encode_record(&self, record: &Record, compressed: bool) -> Result<Vec<u8>> {
        let wire = WireRecord {
            kind: record.get(FIELD_TYPE),
            seq: record.get(FIELD_SEQ),
            data: record.get(FIELD_DATA),
            uid: record.get(FIELD_UID),
            sticky: matches!(record.get(FIELD_STICKY), Some(Value::Bool(true))),
        };
        self.frame(&wire, compressed)
    }

    /// Decode one delivered buffer.
    ///
    /// Returns `Ok(None)` for an empty buffer (peer closed).
    pub fn decode(&self, buffer: &[u8], compressed: bool) -> Result<Option<Message>> {
        Ok(self
            .decode_detailed(buffer, compressed)?
            .map(|decoded| decoded.message))
    }

    /// Like [`FrameCodec::decode`], also reporting dropped frames.
    ///
    /// # Errors
    /// - `Decode` if decompression or JSON parsing fails (carries the raw buffer)
    /// - `CorruptMessage` if the frame is valid JSON but not an object
    /// - `UnknownType`, `MissingField` from schema validation
    /// - `InvalidField` if a schema field has the wrong JSON type
    pub fn decode_detailed(&self, buffer: &[u8], compressed: bool) -> Result<Option<Decoded>> {
        if buffer.is_empty() {
            return Ok(None);
        }

        let text: Cow<'_, str> = if compressed {
            let text = self
                .compressor
                .decompress(buffer)
                .map_err(|e| ProtocolError::Decode {
                    source: DecodeCause::Decompression(e.to_string()),
                    raw: raw_string(buffer),
                })?;
            Cow::Owned(text)
        } else {
            String::from_utf8_lossy(buffer)
        };

        let (frame, discarded_frames) = select_last_frame(&text);

        let value: Value = serde_json::from_str(frame).map_err(|e| ProtocolError::Decode {
            source: DecodeCause::Json(e),
            raw: raw_string(buffer),
        })?;

        let Value::Object(record) = value else {
            return Err(ProtocolError::CorruptMessage);
        };

        let record = validator::validate(record)?;
        let message = Message::try_from(record)?;

        Ok(Some(Decoded {
            message,
            discarded_frames,
        }))
    }

    fn frame<T: Serialize>(&self, wire: &T, compressed: bool) -> Result<Vec<u8>> {
        let mut text =
            serde_json::to_string(wire).map_err(|e| ProtocolError::SerializeError(e.to_string()))?;
        text.push(FRAME_DELIMITER);

        if compressed {
            self.compressor.compress(&text)
        } else {
            Ok(text.into_bytes())
        }
    }
}

/// Pick the frame decode will parse, and count the segments before it.
///
/// With a trailing delimiter the last frame is the second-to-last segment,
/// otherwise it is the last segment.
pub fn select_last_frame(text: &str) -> (&str, usize) {
    let text = text.strip_suffix(FRAME_DELIMITER).unwrap_or(text);
    match text.rsplit_once(FRAME_DELIMITER) {
        Some((earlier, last)) => (last, earlier.split(FRAME_DELIMITER).count()),
        None => (text, 0),
    }
}

fn raw_string(buffer: &[u8]) -> String {
    String::from_utf8_lossy(buffer).into_owned()
}

/// Encode with the default (LZ4) compressor.
pub fn encode(message: &Message, compressed: bool) -> Result<Vec<u8>> {
    FrameCodec::<CompressionKind>::default().encode(message, compressed)
}

/// Encode a loose record with the default (LZ4) compressor.
pub fn encode_record(record: &Record, compressed: bool) -> Result<Vec<u8>> {
    FrameCodec::<CompressionKind>::default().encode_record(record, compressed)
}

/// Decode with the default (LZ4) compressor. `Ok(None)` means the peer closed.
pub fn decode(buffer: &[u8], compressed: bool) -> Result<Option<Message>> {
    FrameCodec::<CompressionKind>::default().decode(buffer, compressed)
}
