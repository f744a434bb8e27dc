use common::{ActiveRef, PackKind, PromptPack, PromptVersion, PromptVersionMeta};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Upper bound on a single prompt field, in Unicode characters.
pub const MAX_PROMPT_CHARS: usize = 100_000;
/// Upper bound on a version note, in Unicode characters.
pub const MAX_NOTE_CHARS: usize = 1_000;

/// Resolve the `{kind}` path segment.
pub fn parse_kind(raw: &str) -> Result<PackKind, AppError> {
    raw.parse()
        .map_err(|_| AppError::NotFound(format!("Unknown prompt pack kind '{raw}'")))
}

/// Request body for creating a prompt version.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateVersionRequest {
    /// Pack content; its fields must match the `{kind}` in the path.
    pub pack: PromptPack,
    /// Optional free-text annotation shown in the version history.
    #[schema(example = "Tighter garment description")]
    pub note: Option<String>,
    /// Also make the new version live. Requires `prompt:activate`.
    #[serde(default)]
    pub activate: bool,
}

pub fn validate_create_request(
    kind: PackKind,
    payload: &CreateVersionRequest,
) -> Result<(), AppError> {
    if payload.pack.kind() != kind {
        return Err(AppError::Validation(format!(
            "Pack fields describe a {} pack, not {kind}",
            payload.pack.kind()
        )));
    }
    for (name, text) in payload.pack.fields() {
        if text.chars().count() > MAX_PROMPT_CHARS {
            return Err(AppError::Validation(format!(
                "{name} must be at most {MAX_PROMPT_CHARS} characters"
            )));
        }
    }
    if let Some(note) = &payload.note
        && note.chars().count() > MAX_NOTE_CHARS
    {
        return Err(AppError::Validation(format!(
            "Note must be at most {MAX_NOTE_CHARS} characters"
        )));
    }
    Ok(())
}

/// Response for a created version.
#[derive(Serialize, utoipa::ToSchema)]
pub struct CreateVersionResponse {
    pub version: PromptVersion,
    /// New pointer state when the request asked for activation.
    pub active: Option<ActiveRef>,
}

/// Request body for moving the active pointer.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivateRequest {
    #[schema(example = "01927c1e-7a4b-7d3e-9f00-3b1c2d4e5f60")]
    pub version_id: String,
}

/// Version history of one pack kind, newest first.
#[derive(Serialize, utoipa::ToSchema)]
pub struct VersionListResponse {
    pub kind: PackKind,
    pub data: Vec<PromptVersionMeta>,
}
