//! Error types for Glide Core

use crate::types::HandleId;
use thiserror::Error;

/// Result type alias for player operations
pub type Result<T> = std::result::Result<T, Error>;

/// Player error types
#[derive(Error, Debug)]
pub enum Error {
    // Media reference errors
    #[error("No media id could be extracted from {url:?}")]
    UnresolvableMedia { url: String },

    #[error("Media id must not be empty")]
    EmptyMediaId,

    // Runtime errors
    #[error("Embed runtime failed to load: {0}")]
    RuntimeLoad(String),

    // Playback errors
    #[error("Player reported error code {code}")]
    Playback { code: i32 },

    #[error("Player did not become ready within {timeout_ms}ms")]
    InitTimeout { timeout_ms: u64 },

    #[error("Another player instance is still active: {active}")]
    PlaybackSlotBusy { active: HandleId },

    #[error("No active player")]
    NoActivePlayer,

    #[error("Invalid playback state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    // Host errors
    #[error("Embed backend error: {0}")]
    Backend(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Navigation error: {0}")]
    Navigation(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        Error::Backend(msg.into())
    }

    /// Returns true if re-running initialization can clear this error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::RuntimeLoad(_)
                | Error::Playback { .. }
                | Error::InitTimeout { .. }
                | Error::PlaybackSlotBusy { .. }
                | Error::Backend(_)
        )
    }

    /// Returns a stable error code for logs and the JS surface
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::UnresolvableMedia { .. } => "UNRESOLVABLE_MEDIA",
            Error::EmptyMediaId => "EMPTY_MEDIA_ID",
            Error::RuntimeLoad(_) => "RUNTIME_LOAD",
            Error::Playback { .. } => "PLAYBACK",
            Error::InitTimeout { .. } => "INIT_TIMEOUT",
            Error::PlaybackSlotBusy { .. } => "SLOT_BUSY",
            Error::NoActivePlayer => "NO_PLAYER",
            Error::InvalidStateTransition { .. } => "INVALID_STATE",
            Error::Backend(_) => "BACKEND",
            Error::Storage(_) => "STORAGE",
            Error::Navigation(_) => "NAVIGATION",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::Json(_) => "JSON",
            Error::Internal(_) => "INTERNAL",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolvable_is_terminal() {
        let err = Error::UnresolvableMedia { url: "https://example.com".into() };
        assert!(!err.is_recoverable());
        assert_eq!(err.error_code(), "UNRESOLVABLE_MEDIA");
    }

    #[test]
    fn test_playback_is_recoverable() {
        let err = Error::Playback { code: 150 };
        assert!(err.is_recoverable());
        assert_eq!(err.to_string(), "Player reported error code 150");
    }
}
