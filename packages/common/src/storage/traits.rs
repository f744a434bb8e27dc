use async_trait::async_trait;

use super::error::StorageError;
use super::hash::ContentHash;
use crate::pack::PackKind;
use crate::version::{ActiveRef, PromptVersion, VersionId};

/// Durable persistence for prompt versions and active pointers.
///
/// Versions are keyed by (kind, version id) and pointers by kind. Callers are
/// responsible for serializing writes per kind; implementations only need to
/// make each single write all-or-nothing.
#[async_trait]
pub trait PromptRepository: Send + Sync {
    /// Persist a new version. Fails with `AlreadyExists` if the id is taken.
    async fn insert_version(&self, version: &PromptVersion) -> Result<(), StorageError>;

    /// Delete a version that was never exposed to readers. Only used to undo
    /// a create whose follow-up pointer write failed. Missing ids are a no-op.
    async fn remove_version(&self, kind: PackKind, id: &VersionId) -> Result<(), StorageError>;

    async fn find_version(
        &self,
        kind: PackKind,
        id: &VersionId,
    ) -> Result<Option<PromptVersion>, StorageError>;

    /// All versions of a kind in insertion order.
    async fn versions(&self, kind: PackKind) -> Result<Vec<PromptVersion>, StorageError>;

    /// Most recent version of a kind whose content hashes to `hash`.
    async fn find_by_hash(
        &self,
        kind: PackKind,
        hash: &ContentHash,
    ) -> Result<Option<PromptVersion>, StorageError> {
        Ok(self
            .versions(kind)
            .await?
            .into_iter()
            .rev()
            .find(|v| v.meta.sha256 == *hash))
    }

    /// Highest sequence number used by a kind, 0 when empty.
    async fn last_sequence(&self, kind: PackKind) -> Result<u64, StorageError> {
        Ok(self
            .versions(kind)
            .await?
            .iter()
            .map(|v| v.meta.sequence)
            .max()
            .unwrap_or(0))
    }

    async fn load_active(&self, kind: PackKind) -> Result<Option<ActiveRef>, StorageError>;

    /// Replace the kind's active pointer.
    async fn store_active(&self, kind: PackKind, active: &ActiveRef) -> Result<(), StorageError>;
}
