//! Streaming decode errors.

use thiserror::Error;

/// Errors that can occur while decoding a generation stream.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The transport ended abnormally before a terminal signal.
    #[error("Stream interrupted before completion")]
    Interrupted,

    /// A single line grew past the configured cap without a terminator.
    #[error("Line buffer exceeded {0} bytes without a newline")]
    BufferOverflow(usize),

    /// IO error from the transport.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-level failure reported by the underlying stream.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl StreamError {
    /// Check if the error is recoverable by reissuing the request.
    ///
    /// Malformed frames are never surfaced as errors at all; everything
    /// here reflects a dead transport, which a caller may retry with a
    /// fresh request and a fresh decoder.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Interrupted | Self::Io(_) | Self::Transport(_))
    }

    /// Wrap any displayable transport error.
    pub fn transport<E: std::fmt::Display>(err: E) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Result type for streaming operations.
pub type StreamResult<T> = Result<T, StreamError>;
