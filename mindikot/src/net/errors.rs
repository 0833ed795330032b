//! Network error types for line framing and message decoding.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The socket failed underneath us.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A line arrived that isn't a valid message envelope.
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),

    /// A line arrived that isn't UTF-8.
    #[error("line is not valid UTF-8")]
    InvalidUtf8,

    #[error("line exceeds maximum of {max} bytes")]
    LineTooLong { max: usize },

    /// The peer closed the connection between messages.
    #[error("connection closed")]
    ConnectionClosed,
}

impl ProtocolError {
    /// Whether the error means the connection itself is gone, as opposed
    /// to the peer having sent something unreadable.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Io(_) | Self::ConnectionClosed)
    }
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
