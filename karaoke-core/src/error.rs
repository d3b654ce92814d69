use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // Bootstrap errors
    #[error("Container with id \"{container_id}\" not found")]
    MissingMountPoint { container_id: String },

    #[error("Failed to load the media player: {0}")]
    PlayerLoadFailed(#[source] PlayerError),

    // Lyrics errors
    #[error("Invalid lyric timestamp: {seconds}")]
    InvalidTimestamp { seconds: f64 },

    #[error("Failed to parse LRC: {reason}")]
    LrcParseError { reason: String },

    #[error("Failed to parse lyrics JSON: {0}")]
    LyricsJson(#[from] serde_json::Error),

    // Configuration errors
    #[error("Config file not found at {path}. A template has been created - edit it and restart.")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid config: {message}")]
    ConfigInvalid { message: String },

    #[error("Failed to parse config file: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    // IO errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors reported by a media player or its loader.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayerError {
    /// The player could not report a playback position right now.
    #[error("Player position unavailable: {reason}")]
    Unavailable { reason: String },

    /// The player exists but has not finished initializing.
    #[error("Player not ready")]
    NotReady,

    /// The player API never became available.
    #[error("Player API failed to load: {reason}")]
    LoadFailed { reason: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
