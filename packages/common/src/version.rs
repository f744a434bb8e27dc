use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::actor::Actor;
use crate::pack::{PackKind, PromptPack};
use crate::storage::ContentHash;

/// Opaque identifier of a prompt version.
///
/// Generated ids are UUIDv7 strings; any string is accepted on lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(transparent)]
pub struct VersionId(String);

impl VersionId {
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for VersionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VersionId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Listing view of a version: everything except the pack content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PromptVersionMeta {
    #[schema(value_type = String, example = "01927c1e-7a4b-7d3e-9f00-3b1c2d4e5f60")]
    pub version_id: VersionId,
    /// Lowercase hex SHA-256 of the pack's canonical encoding.
    #[schema(value_type = String, example = "6811cef912471355efe019e66ec89819d868883f42c412adbdab1a2c18a5b13c")]
    pub sha256: ContentHash,
    /// Unix epoch milliseconds.
    #[schema(example = 1_760_000_000_000_i64)]
    pub created_at: i64,
    pub created_by: Actor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// 1-based insertion ordinal within the pack kind.
    #[schema(example = 3)]
    pub sequence: u64,
}

/// An immutable snapshot of a prompt pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PromptVersion {
    #[serde(flatten)]
    pub meta: PromptVersionMeta,
    pub pack: PromptPack,
}

impl PromptVersion {
    pub fn id(&self) -> &VersionId {
        &self.meta.version_id
    }

    pub fn kind(&self) -> PackKind {
        self.pack.kind()
    }
}

/// The live-version pointer of a pack kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActiveRef {
    #[schema(value_type = String)]
    pub version_id: VersionId,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
    pub updated_by: Actor,
}

/// Pointer state of a pack kind. `Unset` until the first activation.
///
/// JSON: `{"state":"unset"}` or `{"state":"active", ...ActiveRef fields}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ActiveState {
    Unset,
    Active(ActiveRef),
}

impl ActiveState {
    pub fn active(&self) -> Option<&ActiveRef> {
        match self {
            ActiveState::Unset => None,
            ActiveState::Active(active) => Some(active),
        }
    }
}

impl From<Option<ActiveRef>> for ActiveState {
    fn from(active: Option<ActiveRef>) -> Self {
        active.map_or(ActiveState::Unset, ActiveState::Active)
    }
}
