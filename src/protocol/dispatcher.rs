use crate::config::TransportConfig;
use crate::core::frame::FrameCodec;
use crate::core::message::{Message, MessageKind};
use crate::error::constants::{ERR_DISPATCHER_READ_LOCK, ERR_DISPATCHER_WRITE_LOCK};
use crate::error::{ProtocolError, Result};
use crate::utils::compression::{CompressionKind, Compressor};
use crate::utils::metrics::CodecMetrics;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn, Span};

type HandlerFn = dyn Fn(&Message) -> Result<Option<Message>> + Send + Sync + 'static;

/// What happened to one inbound buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Empty buffer: the peer closed the connection.
    Closed,
    /// A handler ran and produced no reply.
    Handled,
    /// A handler replied; these bytes are ready to write back.
    Reply(Vec<u8>),
}

/// Routes validated messages to per-kind handlers on behalf of a connection layer.
///
/// Failures are reported through the span given at construction and still
/// returned to the caller, which decides whether to drop the frame or the
/// connection.
///
/// Handlers run after the handler map's lock is released, so a handler may
/// register or replace handlers on the dispatcher running it.
pub struct Dispatcher<C = CompressionKind> {
    handlers: Arc<RwLock<HashMap<MessageKind, Arc<HandlerFn>>>>,
    frames: FrameCodec<C>,
    compressed: bool,
    metrics: Arc<CodecMetrics>,
    span: Span,
}

impl Dispatcher<CompressionKind> {
    pub fn new(compressed: bool, span: Span) -> Self {
        Self::with_codec(FrameCodec::default(), compressed, span)
    }

    /// Dispatcher using the compression settings of a transport section.
    pub fn from_config(config: &TransportConfig, span: Span) -> Self {
        Self::with_codec(
            FrameCodec::new(config.compression_kind),
            config.compression_enabled,
            span,
        )
    }
}

impl<C: Compressor> Dispatcher<C> {
    pub fn with_codec(frames: FrameCodec<C>, compressed: bool, span: Span) -> Self {
        Self {
            handlers: Arc::new(RwLock::new(HashMap::new())),
            frames,
            compressed,
            metrics: Arc::new(CodecMetrics::new()),
            span,
        }
    }

    pub fn metrics(&self) -> Arc<CodecMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Register (or replace) the handler for one message kind.
    pub fn register<F>(&self, kind: MessageKind, handler: F) -> Result<()>
    where
        F: Fn(&Message) -> Result<Option<Message>> + Send + Sync + 'static,
    {
        let mut handlers = self
            .handlers
            .write()
            .map_err(|_| ProtocolError::LockPoisoned(ERR_DISPATCHER_WRITE_LOCK))?;

        handlers.insert(kind, Arc::new(handler));
        Ok(())
    }

    pub fn dispatch(&self, msg: &Message) -> Result<Option<Message>> {
        let handler = self
            .handlers
            .read()
            .map_err(|_| ProtocolError::LockPoisoned(ERR_DISPATCHER_READ_LOCK))?
            .get(&msg.kind())
            .cloned()
            .ok_or(ProtocolError::NoHandler(msg.kind()))?;

        handler(msg)
    }

    /// Decode one delivered buffer, run its handler and encode any reply.
    pub fn handle_buffer(&self, buffer: &[u8]) -> Result<Outcome> {
        let _entered = self.span.enter();

        let decoded = match self.frames.decode_detailed(buffer, self.compressed) {
            Ok(Some(decoded)) => decoded,
            Ok(None) => {
                self.metrics.closed();
                debug!("Peer closed connection");
                return Ok(Outcome::Closed);
            }
            Err(e) => {
                if e.is_validation() {
                    self.metrics.validation_error();
                } else {
                    self.metrics.decode_error();
                }
                warn!(error = %e, bytes = buffer.len(), "Rejected incoming frame");
                return Err(e);
            }
        };

        if decoded.discarded_frames > 0 {
            debug!(
                discarded = decoded.discarded_frames,
                "Coalesced buffer; only the last frame was decoded"
            );
        }
        self.metrics
            .frame_received(buffer.len() as u64, decoded.discarded_frames as u64);

        let reply = self.dispatch(&decoded.message).map_err(|e| {
            warn!(error = %e, kind = %decoded.message.kind(), seq = decoded.message.seq(), "Handler failed");
            e
        })?;

        match reply {
            None => Ok(Outcome::Handled),
            Some(reply) => {
                let bytes = self.frames.encode(&reply, self.compressed)?;
                self.metrics.frame_sent(bytes.len() as u64);
                Ok(Outcome::Reply(bytes))
            }
        }
    }
}
