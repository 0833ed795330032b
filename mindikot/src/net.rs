//! Networking layer for host/client communication.
//!
//! Messages are JSON envelopes (`{"type": ..., "data": ...}`), one per line
//! over TCP. The host runs on Tokio; a blocking client is provided for bots
//! and tests.

/// Blocking TCP client holding one seat.
pub mod client;

/// Protocol error types.
pub mod errors;

/// Message types for the host/client protocol.
pub mod messages;

/// Tokio TCP host: acceptor plus per-connection reader and writer tasks.
pub mod server;

/// Line framing helpers, blocking and async.
pub mod utils;
