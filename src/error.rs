//! Engine Error Types
//!
//! Errors surfaced at the engine boundary. The interaction core itself
//! has no fatal error class: hit-test misses, stale timers and tracking
//! loss all degrade to `Idle` or a no-op. Only API misuse (an invalid
//! rectangle, a bad configuration) and host plumbing failures end up here.

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Engine error types
#[derive(Error, Debug)]
pub enum EngineError {
    /// Target rectangle with non-finite coordinates or non-positive size
    #[error("Invalid target rect for '{id}': x={x}, y={y}, w={width}, h={height}")]
    InvalidTargetRect {
        /// Target identifier
        id: String,
        /// Left edge
        x: f64,
        /// Top edge
        y: f64,
        /// Width
        width: f64,
        /// Height
        height: f64,
    },

    /// Target identifier was empty
    #[error("Target id must not be empty")]
    EmptyTargetId,

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Runtime input or output channel closed
    #[error("Engine channel closed: {0}")]
    ChannelClosed(&'static str),

    /// Trace line could not be decoded
    #[error("Trace parse error at line {line}: {message}")]
    TraceParse {
        /// 1-based line number
        line: usize,
        /// Decoder message
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error classification for recovery strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller handed the engine bad input; drop it and carry on
    Input,
    /// Configuration problem; fix the config and restart
    Config,
    /// Host plumbing failed (channels, IO)
    Runtime,
}

/// Classify error for recovery strategy selection
pub fn classify_error(error: &EngineError) -> ErrorKind {
    match error {
        EngineError::InvalidTargetRect { .. }
        | EngineError::EmptyTargetId
        | EngineError::TraceParse { .. } => ErrorKind::Input,

        EngineError::InvalidConfig(_) => ErrorKind::Config,

        EngineError::ChannelClosed(_) | EngineError::Io(_) => ErrorKind::Runtime,
    }
}
