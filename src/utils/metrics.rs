//! Frame-level counters
//!
//! Atomic counters a connection layer can share across handlers to watch
//! traffic and decode failures. Frames dropped by the coalesced-buffer policy
//! are counted separately so the loss is visible.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Counters for frames flowing through one dispatcher or connection layer
#[derive(Debug)]
pub struct CodecMetrics {
    pub frames_received: AtomicU64,
    pub frames_sent: AtomicU64,
    pub bytes_received: AtomicU64,
    pub bytes_sent: AtomicU64,
    /// Earlier frames of coalesced buffers that decode dropped
    pub frames_discarded: AtomicU64,
    /// Malformed payloads (bad compression, bad JSON, non-object)
    pub decode_errors: AtomicU64,
    /// Schema failures (unknown type, missing or mistyped field)
    pub validation_errors: AtomicU64,
    /// Empty buffers, i.e. the peer closed the connection
    pub peer_closed: AtomicU64,
    start_time: Instant,
}

impl CodecMetrics {
    pub fn new() -> Self {
        Self {
            frames_received: AtomicU64::new(0),
            frames_sent: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            frames_discarded: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            validation_errors: AtomicU64::new(0),
            peer_closed: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a decoded frame and the frames dropped before it
    pub fn frame_received(&self, byte_count: u64, discarded: u64) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(byte_count, Ordering::Relaxed);
        self.frames_discarded.fetch_add(discarded, Ordering::Relaxed);
    }

    pub fn frame_sent(&self, byte_count: u64) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(byte_count, Ordering::Relaxed);
    }

    pub fn decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn validation_error(&self) {
        self.validation_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn closed(&self) {
        self.peer_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            frames_discarded: self.frames_discarded.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            validation_errors: self.validation_errors.load(Ordering::Relaxed),
            peer_closed: self.peer_closed.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_summary(&self) {
        let snapshot = self.snapshot();
        info!(
            frames_received = snapshot.frames_received,
            frames_sent = snapshot.frames_sent,
            bytes_received = snapshot.bytes_received,
            bytes_sent = snapshot.bytes_sent,
            frames_discarded = snapshot.frames_discarded,
            decode_errors = snapshot.decode_errors,
            validation_errors = snapshot.validation_errors,
            peer_closed = snapshot.peer_closed,
            uptime_seconds = snapshot.uptime_seconds,
            "Frame metrics snapshot"
        );
    }
}

impl Default for CodecMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub frames_received: u64,
    pub frames_sent: u64,
    pub bytes_received: u64,
    pub bytes_sent: u64,
    pub frames_discarded: u64,
    pub decode_errors: u64,
    pub validation_errors: u64,
    pub peer_closed: u64,
    pub uptime_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = CodecMetrics::new();
        metrics.frame_received(40, 2);
        metrics.frame_received(10, 0);
        metrics.frame_sent(25);
        metrics.decode_error();
        metrics.validation_error();
        metrics.closed();

        let snap = metrics.snapshot();
        assert_eq!(snap.frames_received, 2);
        assert_eq!(snap.bytes_received, 50);
        assert_eq!(snap.frames_discarded, 2);
        assert_eq!(snap.frames_sent, 1);
        assert_eq!(snap.bytes_sent, 25);
        assert_eq!(snap.decode_errors, 1);
        assert_eq!(snap.validation_errors, 1);
        assert_eq!(snap.peer_closed, 1);
    }
}
