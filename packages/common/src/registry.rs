use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{error, info, instrument, warn};

use crate::actor::Actor;
use crate::config::DuplicatePolicy;
use crate::error::PromptError;
use crate::pack::{PackKind, PromptPack};
use crate::storage::{PromptRepository, StorageError};
use crate::version::{ActiveRef, ActiveState, PromptVersion, PromptVersionMeta, VersionId};

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Version store and active pointer for every pack kind.
///
/// Mutations of one kind are serialized by that kind's lock, which is held
/// from validation until the write lands. Reads take no lock.
pub struct PromptRegistry {
    repo: Arc<dyn PromptRepository>,
    duplicate_policy: DuplicatePolicy,
    direct_lock: Mutex<()>,
    workflow_lock: Mutex<()>,
}

impl PromptRegistry {
    pub fn new(repo: Arc<dyn PromptRepository>, duplicate_policy: DuplicatePolicy) -> Self {
        Self {
            repo,
            duplicate_policy,
            direct_lock: Mutex::new(()),
            workflow_lock: Mutex::new(()),
        }
    }

    async fn lock_kind(&self, kind: PackKind) -> MutexGuard<'_, ()> {
        match kind {
            PackKind::Direct => self.direct_lock.lock().await,
            PackKind::Workflow => self.workflow_lock.lock().await,
        }
    }

    /// Append a new immutable version of `pack`.
    ///
    /// Under [`DuplicatePolicy::Reuse`] an existing version with identical
    /// content is returned instead and nothing is written.
    #[instrument(skip(self, pack, author, note), fields(kind = %pack.kind(), author = %author.username))]
    pub async fn create_version(
        &self,
        pack: PromptPack,
        author: Actor,
        note: Option<String>,
    ) -> Result<PromptVersion, PromptError> {
        let kind = pack.kind();
        let _guard = self.lock_kind(kind).await;
        let (version, _) = self.create_locked(pack, author, note).await?;
        Ok(version)
    }

    /// Create a version and point the kind at it in one serialized step.
    ///
    /// If the pointer write fails, a version created by this call is removed
    /// again so the error leaves the store as it was.
    #[instrument(skip(self, pack, author, note), fields(kind = %pack.kind(), author = %author.username))]
    pub async fn create_and_activate(
        &self,
        pack: PromptPack,
        author: Actor,
        note: Option<String>,
    ) -> Result<(PromptVersion, ActiveRef), PromptError> {
        let kind = pack.kind();
        let _guard = self.lock_kind(kind).await;
        let (version, created) = self.create_locked(pack, author.clone(), note).await?;

        match self.activate_locked(kind, version.id(), author).await {
            Ok(active) => Ok((version, active)),
            Err(e) => {
                if created {
                    warn!(version_id = %version.id(), error = %e, "Activation failed, removing new version");
                    if let Err(rollback) = self.repo.remove_version(kind, version.id()).await {
                        error!(version_id = %version.id(), error = %rollback, "Failed to remove version after activation error");
                    }
                }
                Err(e)
            }
        }
    }

    /// Returns the version and whether it was written by this call.
    async fn create_locked(
        &self,
        pack: PromptPack,
        author: Actor,
        note: Option<String>,
    ) -> Result<(PromptVersion, bool), PromptError> {
        pack.validate()?;
        let kind = pack.kind();
        let sha256 = pack
            .content_hash()
            .map_err(|e| PromptError::Encoding(e.to_string()))?;
        let note = note
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty());

        if self.duplicate_policy == DuplicatePolicy::Reuse
            && let Some(existing) = self.repo.find_by_hash(kind, &sha256).await?
        {
            info!(version_id = %existing.id(), %sha256, "Identical content already stored, reusing version");
            return Ok((existing, false));
        }

        let sequence = self.repo.last_sequence(kind).await? + 1;
        let version = PromptVersion {
            meta: PromptVersionMeta {
                version_id: VersionId::generate(),
                sha256,
                created_at: now_millis(),
                created_by: author,
                note,
                sequence,
            },
            pack,
        };

        self.repo.insert_version(&version).await?;
        info!(version_id = %version.id(), sequence, %sha256, "Prompt version created");

        Ok((version, true))
    }

    pub async fn get_version(
        &self,
        kind: PackKind,
        id: &VersionId,
    ) -> Result<PromptVersion, PromptError> {
        self.repo
            .find_version(kind, id)
            .await?
            .ok_or_else(|| PromptError::NotFound {
                kind,
                id: id.clone(),
            })
    }

    /// Version metadata, newest first. Equal timestamps fall back to
    /// insertion order, later first.
    pub async fn list_versions(&self, kind: PackKind) -> Result<Vec<PromptVersionMeta>, PromptError> {
        let mut metas: Vec<PromptVersionMeta> = self
            .repo
            .versions(kind)
            .await?
            .into_iter()
            .map(|v| v.meta)
            .collect();

        metas.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.sequence.cmp(&a.sequence))
        });

        Ok(metas)
    }

    /// Point `kind` at an existing version. Re-activating the current
    /// version still refreshes `updated_at` and `updated_by`.
    #[instrument(skip(self, actor), fields(actor = %actor.username))]
    pub async fn activate(
        &self,
        kind: PackKind,
        id: &VersionId,
        actor: Actor,
    ) -> Result<ActiveRef, PromptError> {
        let _guard = self.lock_kind(kind).await;
        self.activate_locked(kind, id, actor).await
    }

    async fn activate_locked(
        &self,
        kind: PackKind,
        id: &VersionId,
        actor: Actor,
    ) -> Result<ActiveRef, PromptError> {
        if self.repo.find_version(kind, id).await?.is_none() {
            warn!(%kind, version_id = %id, "Activation of unknown version rejected");
            return Err(PromptError::UnknownVersion {
                kind,
                id: id.clone(),
            });
        }

        let active = ActiveRef {
            version_id: id.clone(),
            updated_at: now_millis(),
            updated_by: actor,
        };
        self.repo.store_active(kind, &active).await?;
        info!(%kind, version_id = %id, "Active prompt version updated");

        Ok(active)
    }

    pub async fn get_active(&self, kind: PackKind) -> Result<ActiveState, PromptError> {
        Ok(self.repo.load_active(kind).await?.into())
    }

    /// The full live version of `kind`, `None` while the pointer is unset.
    pub async fn get_active_pack(&self, kind: PackKind) -> Result<Option<PromptVersion>, PromptError> {
        let Some(active) = self.repo.load_active(kind).await? else {
            return Ok(None);
        };

        let version = self
            .repo
            .find_version(kind, &active.version_id)
            .await?
            .ok_or_else(|| StorageError::Corrupt {
                location: format!("{kind}/active"),
                reason: format!("points at missing version {}", active.version_id),
            })?;

        Ok(Some(version))
    }
}
