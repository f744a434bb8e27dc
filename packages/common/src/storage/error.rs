use thiserror::Error;

/// Failures of the persistence layer behind the prompt registry.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("record serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The provided content hash is malformed.
    #[error("invalid content hash: {0}")]
    InvalidHash(String),

    /// The key cannot be mapped onto the backing store.
    #[error("invalid record key: {0}")]
    InvalidKey(String),

    /// A record with this identifier is already persisted.
    #[error("record already exists: {0}")]
    AlreadyExists(String),

    /// A persisted record failed its integrity check.
    #[error("corrupt record {location}: {reason}")]
    Corrupt { location: String, reason: String },
}
