//! Error types for the companion core.

use crate::audio::wav::WavFormatError;
use crate::endpoint::registry::RegistryError;
use crate::endpoint::resolver::ResolveError;

/// Top-level error type for the conversation core.
#[derive(Debug, thiserror::Error)]
pub enum CompanionError {
    /// Transport-level failure (connection refused, DNS failure, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The reply stream died or violated the stream protocol.
    #[error("stream error: {0}")]
    Stream(String),

    /// Voice synthesis request error.
    #[error("voice error: {0}")]
    Voice(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Endpoint resolution failure.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Registry fetch or parse failure.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Malformed WAV payload.
    #[error(transparent)]
    WavFormat(#[from] WavFormatError),

    /// Memory store error.
    #[error("memory error: {0}")]
    Memory(String),

    /// The turn was cancelled before the stream completed.
    #[error("conversation cancelled")]
    Cancelled,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, CompanionError>;
