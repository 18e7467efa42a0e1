//! Error types for settings persistence

use thiserror::Error;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, SettingsError>;

/// Errors that can occur while loading or saving settings
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The settings document could not be parsed
    #[error("Failed to parse settings: {0}")]
    ParseError(String),

    /// The settings document could not be serialized
    #[error("Failed to serialize settings: {0}")]
    SerializeError(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<serde_json::Error> for SettingsError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            Self::IoError(err.into())
        } else {
            Self::ParseError(err.to_string())
        }
    }
}
