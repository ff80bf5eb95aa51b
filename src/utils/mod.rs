//! # Utility Modules
//!
//! Supporting utilities for compression, logging and metrics.
//!
//! ## Components
//! - **Compression**: LZ4 and Zstd behind the `Compressor` trait, with a decompression size limit
//! - **Logging**: `tracing` subscriber setup from configuration
//! - **Metrics**: Thread-safe frame counters

pub mod compression;
pub mod logging;
pub mod metrics;

pub use compression::{CompressionKind, Compressor};
pub use metrics::{CodecMetrics, MetricsSnapshot};
