use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::error::StorageError;
use super::traits::PromptRepository;
use crate::pack::PackKind;
use crate::version::{ActiveRef, PromptVersion, VersionId};

#[derive(Default)]
struct KindState {
    versions: Vec<PromptVersion>,
    active: Option<ActiveRef>,
}

/// Process-local repository. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryPromptRepository {
    kinds: RwLock<HashMap<PackKind, KindState>>,
}

impl MemoryPromptRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PromptRepository for MemoryPromptRepository {
    async fn insert_version(&self, version: &PromptVersion) -> Result<(), StorageError> {
        let mut kinds = self.kinds.write().await;
        let state = kinds.entry(version.kind()).or_default();
        if state.versions.iter().any(|v| v.id() == version.id()) {
            return Err(StorageError::AlreadyExists(version.id().to_string()));
        }
        state.versions.push(version.clone());
        Ok(())
    }

    async fn remove_version(&self, kind: PackKind, id: &VersionId) -> Result<(), StorageError> {
        if let Some(state) = self.kinds.write().await.get_mut(&kind) {
            state.versions.retain(|v| v.id() != id);
        }
        Ok(())
    }

    async fn find_version(
        &self,
        kind: PackKind,
        id: &VersionId,
    ) -> Result<Option<PromptVersion>, StorageError> {
        let kinds = self.kinds.read().await;
        Ok(kinds
            .get(&kind)
            .and_then(|s| s.versions.iter().find(|v| v.id() == id))
            .cloned())
    }

    async fn versions(&self, kind: PackKind) -> Result<Vec<PromptVersion>, StorageError> {
        let kinds = self.kinds.read().await;
        Ok(kinds
            .get(&kind)
            .map(|s| s.versions.clone())
            .unwrap_or_default())
    }

    async fn last_sequence(&self, kind: PackKind) -> Result<u64, StorageError> {
        let kinds = self.kinds.read().await;
        Ok(kinds
            .get(&kind)
            .and_then(|s| s.versions.last())
            .map_or(0, |v| v.meta.sequence))
    }

    async fn load_active(&self, kind: PackKind) -> Result<Option<ActiveRef>, StorageError> {
        let kinds = self.kinds.read().await;
        Ok(kinds.get(&kind).and_then(|s| s.active.clone()))
    }

    async fn store_active(&self, kind: PackKind, active: &ActiveRef) -> Result<(), StorageError> {
        self.kinds.write().await.entry(kind).or_default().active = Some(active.clone());
        Ok(())
    }
}
