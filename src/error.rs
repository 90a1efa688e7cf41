//! Error types for memwire-client.

use thiserror::Error;

use crate::protocol::MessageType;

/// Main error type for all memwire operations.
#[derive(Debug, Error)]
pub enum MemwireError {
    /// I/O error from the underlying transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error while loading configuration.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The reply did not belong to the request just sent, or was malformed.
    #[error("Invalid reply: {0}")]
    InvalidReply(#[from] InvalidReply),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Reasons a reply is rejected by the framing layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidReply {
    /// Fewer bytes than a full header.
    #[error("reply is {0} bytes, shorter than the header")]
    Truncated(usize),

    #[error("protocol version {actual}, expected {expected}")]
    Version { expected: u32, actual: u32 },

    /// Reply correlates to some other (stale or foreign) request.
    #[error("request id {actual:#010x}, expected {expected:#010x}")]
    RequestId { expected: u32, actual: u32 },

    #[error("unknown message type {0}")]
    UnknownMessageType(u32),

    #[error("message type {actual:?}, expected {expected:?}")]
    MessageType {
        expected: MessageType,
        actual: MessageType,
    },

    /// Declared payload length differs from the bytes actually received.
    #[error("declared payload length {declared}, received {actual}")]
    PayloadLength { declared: u32, actual: usize },

    /// Read reply carried no data for a non-empty request.
    #[error("empty read reply for a {requested} byte request")]
    EmptyRead { requested: u32 },

    /// Read reply carried more data than was requested.
    #[error("read reply of {actual} bytes exceeds the {requested} requested")]
    ReadOverrun { requested: u32, actual: usize },
}

/// Result type alias using MemwireError.
pub type Result<T> = std::result::Result<T, MemwireError>;
