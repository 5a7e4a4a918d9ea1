//! Error types for evoke-rpc.

use std::time::Duration;

use thiserror::Error;

/// Main error type for all evoke-rpc operations.
#[derive(Debug, Error)]
pub enum RpcError {
    /// I/O error on an established connection (reset, broken pipe, ...).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Could not open a connection to the server (refused, unresolvable host).
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        /// Address the connection was attempted against.
        addr: String,
        /// Underlying socket error.
        #[source]
        source: std::io::Error,
    },

    /// Frame body is not a valid envelope.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// Request envelope carries an empty function name.
    #[error("function name must not be empty")]
    EmptyFunctionName,

    /// Buffered bytes grew past the maximum frame size.
    #[error("frame of {size} bytes exceeds maximum {max}")]
    FrameTooLarge {
        /// Number of bytes seen so far for this frame.
        size: usize,
        /// Configured maximum.
        max: usize,
    },

    /// A frame body contains the delimiter and would be mis-split by the peer.
    #[error("frame body contains the frame delimiter")]
    DelimiterInPayload,

    /// Peer closed the connection before a complete frame arrived.
    #[error("connection closed before a complete frame was received")]
    ConnectionClosed,

    /// Call deadline elapsed.
    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    /// `listen` called on a server that is already listening.
    #[error("server is already listening")]
    AlreadyListening,

    /// Startup round trip against the reserved test function failed.
    #[error("self-test failed: {0}")]
    SelfTest(String),

    /// Remote handler reported an error.
    #[error("remote error: {0}")]
    Remote(String),
}

impl From<serde_json::Error> for RpcError {
    fn from(err: serde_json::Error) -> Self {
        RpcError::MalformedEnvelope(err.to_string())
    }
}

/// Result type alias using RpcError.
pub type Result<T> = std::result::Result<T, RpcError>;
