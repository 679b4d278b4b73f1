//! Error types for the manifest inspector.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Manifest file does not exist
    #[error("manifest file not found: {0}")]
    MissingManifest(PathBuf),

    /// Manifest path points at something other than a regular file
    #[error("manifest path is not a file: {0}")]
    NotAFile(PathBuf),

    /// Stream name argument cannot match any stream
    #[error("invalid stream name '{0}': expected '.' or a './'-rooted path")]
    InvalidStreamName(String),
}

/// Errors raised while running a command against a decoded manifest.
#[derive(Debug, Error)]
pub enum CommandError {
    /// No stream with the requested name
    #[error("stream not found: {0}")]
    StreamNotFound(String),

    /// The stream exists but holds no file with the requested name
    #[error("file '{file}' not found in stream '{stream}'")]
    FileNotFound {
        /// Stream that was searched
        stream: String,
        /// File name that was requested
        file: String,
    },
}
