//! Error types for the save store.

use thiserror::Error;

/// Errors raised by a key-value backend adapter.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid key: {0:?}")]
    InvalidKey(String),

    #[error("Value for {key} is {size} bytes (limit {limit})")]
    ValueTooLarge {
        key: String,
        size: usize,
        limit: usize,
    },

    #[error("Backend is locked by another process")]
    Locked,

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Main error type for save store operations.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Chunk {index} of {expected} is missing")]
    MissingChunk { index: usize, expected: usize },

    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("Checksum mismatch: expected {expected:#010x}, got {got:#010x}")]
    ChecksumMismatch { expected: u32, got: u32 },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Unsupported save version {found} (current is {current})")]
    UnsupportedVersion { found: String, current: String },

    #[error("Payload needs {chunks} chunks (limit {limit})")]
    TooManyChunks { chunks: usize, limit: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SaveError {
    /// Whether this error means the stored save exists but cannot be used.
    ///
    /// Backend and configuration errors are not corruption: retrying later,
    /// or with a fixed config, may succeed.
    pub fn is_corrupt(&self) -> bool {
        matches!(
            self,
            SaveError::MissingChunk { .. }
                | SaveError::InvalidMetadata(_)
                | SaveError::ChecksumMismatch { .. }
                | SaveError::Decode(_)
                | SaveError::UnsupportedVersion { .. }
        )
    }
}

// JSON errors reaching `?` come from decoding stored data.
impl From<serde_json::Error> for SaveError {
    fn from(e: serde_json::Error) -> Self {
        SaveError::Decode(e.to_string())
    }
}

/// Result type for save store operations.
pub type Result<T> = std::result::Result<T, SaveError>;

/// Result type for backend operations.
pub type BackendResult<T> = std::result::Result<T, BackendError>;
