use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, warn};

use super::error::StorageError;
use super::traits::PromptRepository;
use crate::pack::PackKind;
use crate::version::{ActiveRef, PromptVersion, VersionId};

const MAX_KEY_LEN: usize = 128;

/// Filesystem-backed prompt repository.
///
/// Layout:
/// `{base_path}/{kind}/versions/{version_id}.json` and
/// `{base_path}/{kind}/active.json`. Every write goes to `{base_path}/.tmp`
/// first and is renamed into place.
///
/// The highest sequence per kind is scanned once at open and then tracked in
/// memory, so creating a version never reads the existing files.
pub struct FilesystemPromptRepository {
    base_path: PathBuf,
    sequences: HashMap<PackKind, AtomicU64>,
}

/// The only field needed from a version file when scanning sequences.
#[derive(Deserialize)]
struct SequenceOnly {
    sequence: u64,
}

impl FilesystemPromptRepository {
    /// Open (and create if needed) a repository rooted at `base_path`.
    pub async fn new(base_path: PathBuf) -> Result<Self, StorageError> {
        fs::create_dir_all(base_path.join(".tmp")).await?;

        let mut sequences = HashMap::new();
        for kind in PackKind::ALL {
            let dir = base_path.join(kind.as_str()).join("versions");
            fs::create_dir_all(&dir).await?;
            let last = Self::scan_last_sequence(&dir).await?;
            sequences.insert(kind, AtomicU64::new(last));
        }

        Ok(Self {
            base_path,
            sequences,
        })
    }

    /// Highest `sequence` among the version files in `dir`. Files that do not
    /// parse are skipped here; reads still report them as corrupt.
    async fn scan_last_sequence(dir: &Path) -> Result<u64, StorageError> {
        let mut entries = fs::read_dir(dir).await?;
        let mut last = 0;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let data = fs::read(&path).await?;
            match serde_json::from_slice::<SequenceOnly>(&data) {
                Ok(record) => last = last.max(record.sequence),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable version file")
                }
            }
        }

        Ok(last)
    }

    fn versions_dir(&self, kind: PackKind) -> PathBuf {
        self.base_path.join(kind.as_str()).join("versions")
    }

    /// `None` when the id cannot be a file name.
    fn version_path(&self, kind: PackKind, id: &VersionId) -> Option<PathBuf> {
        let key = id.as_str();
        let safe = !key.is_empty()
            && key.len() <= MAX_KEY_LEN
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        safe.then(|| self.versions_dir(kind).join(format!("{key}.json")))
    }

    fn active_path(&self, kind: PackKind) -> PathBuf {
        self.base_path.join(kind.as_str()).join("active.json")
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }

    async fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), StorageError> {
        let data = serde_json::to_vec_pretty(value)?;
        let temp_path = self.temp_path();

        if let Err(e) = fs::write(&temp_path, &data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Err(e) = fs::rename(&temp_path, path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(())
    }

    async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
        match fs::read(path).await {
            Ok(data) => serde_json::from_slice(&data)
                .map(Some)
                .map_err(|e| corrupt(path, e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Check a loaded version against the key it was stored under and its own hash.
    fn verify(
        path: &Path,
        kind: PackKind,
        expected_id: Option<&VersionId>,
        version: &PromptVersion,
    ) -> Result<(), StorageError> {
        if version.kind() != kind {
            return Err(corrupt(
                path,
                format!("holds a {} pack, expected {kind}", version.kind()),
            ));
        }
        if let Some(id) = expected_id
            && version.id() != id
        {
            return Err(corrupt(path, format!("holds version {}", version.id())));
        }
        let actual = version
            .pack
            .content_hash()
            .map_err(|e| corrupt(path, e.to_string()))?;
        if actual != version.meta.sha256 {
            return Err(corrupt(
                path,
                format!("sha256 {} does not match content {actual}", version.meta.sha256),
            ));
        }
        Ok(())
    }
}

fn corrupt(path: &Path, reason: impl Into<String>) -> StorageError {
    StorageError::Corrupt {
        location: path.display().to_string(),
        reason: reason.into(),
    }
}

#[async_trait]
impl PromptRepository for FilesystemPromptRepository {
    async fn insert_version(&self, version: &PromptVersion) -> Result<(), StorageError> {
        let kind = version.kind();
        let path = self
            .version_path(kind, version.id())
            .ok_or_else(|| StorageError::InvalidKey(version.id().to_string()))?;

        if fs::try_exists(&path).await? {
            return Err(StorageError::AlreadyExists(version.id().to_string()));
        }

        self.write_json(&path, version).await?;
        if let Some(last) = self.sequences.get(&kind) {
            last.fetch_max(version.meta.sequence, Ordering::SeqCst);
        }
        debug!(%kind, version_id = %version.id(), path = %path.display(), "Version written");
        Ok(())
    }

    async fn remove_version(&self, kind: PackKind, id: &VersionId) -> Result<(), StorageError> {
        let Some(path) = self.version_path(kind, id) else {
            return Ok(());
        };

        let sequence = Self::read_json::<SequenceOnly>(&path)
            .await
            .ok()
            .flatten()
            .map(|r| r.sequence);

        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        }

        if let (Some(sequence), Some(last)) = (sequence, self.sequences.get(&kind)) {
            let _ = last.compare_exchange(
                sequence,
                sequence.saturating_sub(1),
                Ordering::SeqCst,
                Ordering::SeqCst,
            );
        }
        debug!(%kind, version_id = %id, "Version removed");
        Ok(())
    }

    async fn find_version(
        &self,
        kind: PackKind,
        id: &VersionId,
    ) -> Result<Option<PromptVersion>, StorageError> {
        let Some(path) = self.version_path(kind, id) else {
            return Ok(None);
        };

        let version: Option<PromptVersion> = Self::read_json(&path).await?;
        if let Some(version) = &version {
            Self::verify(&path, kind, Some(id), version)?;
        }
        Ok(version)
    }

    async fn versions(&self, kind: PackKind) -> Result<Vec<PromptVersion>, StorageError> {
        let mut entries = fs::read_dir(self.versions_dir(kind)).await?;
        let mut versions = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(VersionId::from)
                .ok_or_else(|| corrupt(&path, "file name is not a version id"))?;
            if let Some(version) = Self::read_json::<PromptVersion>(&path).await? {
                Self::verify(&path, kind, Some(&stem), &version)?;
                versions.push(version);
            }
        }

        versions.sort_by_key(|v| v.meta.sequence);
        Ok(versions)
    }

    async fn last_sequence(&self, kind: PackKind) -> Result<u64, StorageError> {
        Ok(self
            .sequences
            .get(&kind)
            .map_or(0, |last| last.load(Ordering::SeqCst)))
    }

    async fn load_active(&self, kind: PackKind) -> Result<Option<ActiveRef>, StorageError> {
        Self::read_json(&self.active_path(kind)).await
    }

    async fn store_active(&self, kind: PackKind, active: &ActiveRef) -> Result<(), StorageError> {
        self.write_json(&self.active_path(kind), active).await
    }
}
