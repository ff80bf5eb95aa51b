//! # Tokio Codec
//!
//! Adapts [`FrameCodec`] to `tokio_util` framing.
//!
//! Plain frames end in `\n`, so on byte streams (`Framed` over TCP) the decoder
//! waits for a delimiter and keeps a partial frame buffered across reads. The
//! complete frames available at that point form one delivered buffer and go
//! through last-frame selection.
//!
//! Compressed frames have no visible delimiter. With compression on, every
//! source buffer is taken whole, so frame boundaries are only reliable where
//! the transport preserves them (`UdpFramed`, which decodes each datagram
//! through `decode_eof`).

use crate::config::{TransportConfig, MAX_FRAME_SIZE};
use crate::core::frame::FrameCodec;
use crate::core::message::{Message, Record};
use crate::error::{ProtocolError, Result};
use crate::utils::compression::{CompressionKind, Compressor};
use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

/// `Decoder`/`Encoder` pair for `Framed`, `FramedRead` and `UdpFramed`.
///
/// An empty source yields `Ok(None)`; end of stream is left to the framed
/// wrapper.
#[derive(Debug, Clone, Default)]
pub struct RelayCodec<C = CompressionKind> {
    frames: FrameCodec<C>,
    compressed: bool,
}

impl RelayCodec<CompressionKind> {
    /// Codec using the default LZ4 compressor when `compressed` is set.
    pub fn new(compressed: bool) -> Self {
        Self::with_codec(FrameCodec::default(), compressed)
    }

    /// Codec matching the compression settings of a transport section.
    pub fn from_config(config: &TransportConfig) -> Self {
        Self::with_codec(
            FrameCodec::new(config.compression_kind),
            config.compression_enabled,
        )
    }
}

impl<C: Compressor> RelayCodec<C> {
    pub fn with_codec(frames: FrameCodec<C>, compressed: bool) -> Self {
        Self { frames, compressed }
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    pub fn frames(&self) -> &FrameCodec<C> {
        &self.frames
    }
}

impl<C: Compressor> Decoder for RelayCodec<C> {
    type Item = Message;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if src.is_empty() {
            return Ok(None);
        }

        if self.compressed {
            let buffer = src.split();
            return self.frames.decode(&buffer, true);
        }

        match src.iter().rposition(|b| *b == b'\n') {
            Some(end) => {
                let buffer = src.split_to(end + 1);
                self.frames.decode(&buffer, false)
            }
            None if src.len() > MAX_FRAME_SIZE => Err(ProtocolError::OversizedFrame(src.len())),
            None => Ok(None),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if src.is_empty() {
            return Ok(None);
        }

        // Whatever is left is one buffer, terminated or not
        let buffer = src.split();
        self.frames.decode(&buffer, self.compressed)
    }
}

impl<C: Compressor> Encoder<Message> for RelayCodec<C> {
    type Error = ProtocolError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<()> {
        let bytes = self.frames.encode(&item, self.compressed)?;
        dst.extend_from_slice(&bytes);
        Ok(())
    }
}

impl<C: Compressor> Encoder<Record> for RelayCodec<C> {
    type Error = ProtocolError;

    fn encode(&mut self, item: Record, dst: &mut BytesMut) -> Result<()> {
        let bytes = self.frames.encode_record(&item, self.compressed)?;
        dst.extend_from_slice(&bytes);
        Ok(())
    }
}
