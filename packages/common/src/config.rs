use std::path::PathBuf;

use serde::Deserialize;

/// Where prompt versions are persisted.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Filesystem,
    Memory,
}

/// What `create_version` does when the submitted content already exists.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Always append a new version.
    #[default]
    Append,
    /// Return the most recent version with the same hash instead.
    Reuse,
}

/// App-level prompt storage configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageAppConfig {
    /// Default: "filesystem".
    #[serde(default)]
    pub backend: StorageBackend,
    /// Root directory for the filesystem backend. Default: "./data/prompts".
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
    /// Default: "append".
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./data/prompts")
}

impl Default for StorageAppConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_storage_path(),
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}
