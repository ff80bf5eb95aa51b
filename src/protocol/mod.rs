//! # Message Routing
//!
//! Per-kind handler dispatch for connection layers built on the frame codec.

pub mod dispatcher;
