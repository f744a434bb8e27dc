use thiserror::Error;

use crate::pack::PackKind;
use crate::storage::StorageError;
use crate::version::VersionId;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("{kind} prompt version not found: {id}")]
    NotFound { kind: PackKind, id: VersionId },

    /// Activation target does not exist in the kind's version store.
    #[error("cannot activate unknown {kind} prompt version: {id}")]
    UnknownVersion { kind: PackKind, id: VersionId },

    #[error("prompt pack encoding failed: {0}")]
    Encoding(String),

    #[error("invalid prompt pack: {0}")]
    InvalidPack(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
