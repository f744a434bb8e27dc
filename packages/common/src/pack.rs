use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PromptError;
use crate::storage::ContentHash;

/// Which editorial feature a prompt pack configures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PackKind {
    /// Single-prompt generation.
    Direct,
    /// Planner + painter two-stage generation.
    Workflow,
}

impl PackKind {
    pub const ALL: [PackKind; 2] = [PackKind::Direct, PackKind::Workflow];

    pub fn as_str(&self) -> &'static str {
        match self {
            PackKind::Direct => "direct",
            PackKind::Workflow => "workflow",
        }
    }
}

impl fmt::Display for PackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackKind {
    type Err = PromptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(PackKind::Direct),
            "workflow" => Ok(PackKind::Workflow),
            other => Err(PromptError::InvalidPack(format!(
                "unknown pack kind '{other}'"
            ))),
        }
    }
}

/// System prompt for the direct generation feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DirectPromptPack {
    #[schema(example = "You are a fashion photographer. Describe the garment precisely.")]
    pub direct_system_prompt: String,
}

/// System prompts for the planner ("brain") and painter stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WorkflowPromptPack {
    #[schema(example = "Analyse the garment and plan the shot list.")]
    pub planner_system_prompt: String,
    #[schema(example = "Render each planned shot on a studio backdrop.")]
    pub painter_system_prompt: String,
}

/// A bundle of system prompts for one pack kind.
///
/// The JSON form carries no tag; the variant is recognised by its field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(untagged)]
pub enum PromptPack {
    Direct(DirectPromptPack),
    Workflow(WorkflowPromptPack),
}

impl PromptPack {
    pub fn direct(prompt: impl Into<String>) -> Self {
        PromptPack::Direct(DirectPromptPack {
            direct_system_prompt: prompt.into(),
        })
    }

    pub fn workflow(planner: impl Into<String>, painter: impl Into<String>) -> Self {
        PromptPack::Workflow(WorkflowPromptPack {
            planner_system_prompt: planner.into(),
            painter_system_prompt: painter.into(),
        })
    }

    pub fn kind(&self) -> PackKind {
        match self {
            PromptPack::Direct(_) => PackKind::Direct,
            PromptPack::Workflow(_) => PackKind::Workflow,
        }
    }

    /// Field names paired with their text, in canonical order.
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        match self {
            PromptPack::Direct(p) => {
                vec![("directSystemPrompt", p.direct_system_prompt.as_str())]
            }
            PromptPack::Workflow(p) => vec![
                ("plannerSystemPrompt", p.planner_system_prompt.as_str()),
                ("painterSystemPrompt", p.painter_system_prompt.as_str()),
            ],
        }
    }

    /// Reject packs with a blank prompt field.
    pub fn validate(&self) -> Result<(), PromptError> {
        for (name, text) in self.fields() {
            if text.trim().is_empty() {
                return Err(PromptError::InvalidPack(format!(
                    "{name} must not be blank"
                )));
            }
        }
        Ok(())
    }

    /// Compact JSON of the variant's fields in declaration order.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn content_hash(&self) -> Result<ContentHash, serde_json::Error> {
        Ok(ContentHash::compute(&self.canonical_bytes()?))
    }
}
