//! Configuration error types.

/// Errors that can occur when loading, saving, or parsing a globe config.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Failed to read the config file from disk.
    #[error("failed to read globe config: {0}")]
    ReadError(#[source] std::io::Error),

    /// Failed to write the config file to disk.
    #[error("failed to write globe config: {0}")]
    WriteError(#[source] std::io::Error),

    /// Failed to parse RON content.
    #[error("failed to parse globe config: {0}")]
    ParseError(#[source] ron::error::SpannedError),

    /// Failed to serialize config to RON.
    #[error("failed to serialize globe config: {0}")]
    SerializeError(#[source] ron::Error),
}
