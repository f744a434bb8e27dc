pub mod actor;
pub mod config;
pub mod error;
pub mod pack;
pub mod registry;
pub mod storage;
pub mod version;

pub use actor::Actor;
pub use config::{DuplicatePolicy, StorageAppConfig, StorageBackend};
pub use error::PromptError;
pub use pack::{DirectPromptPack, PackKind, PromptPack, WorkflowPromptPack};
pub use registry::PromptRegistry;
pub use version::{ActiveRef, ActiveState, PromptVersion, PromptVersionMeta, VersionId};
