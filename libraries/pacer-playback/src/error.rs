//! Error types for playback scheduling

use pacer_core::PacerError;
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Store, asset or validation failure from the core crate
    #[error(transparent)]
    Core(#[from] PacerError),

    /// Asset bytes could not be decoded into audio
    #[error("Decode error: {0}")]
    Decode(String),

    /// Scheduler configuration rejected
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PlaybackError {
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Whether this error is a missing track, program or asset
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Core(err) if err.is_not_found())
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
