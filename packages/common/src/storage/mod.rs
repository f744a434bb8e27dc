mod error;
mod hash;
mod traits;

pub mod filesystem;
pub mod memory;

use std::sync::Arc;

pub use error::StorageError;
pub use hash::ContentHash;
pub use traits::PromptRepository;

use crate::config::{StorageAppConfig, StorageBackend};

/// Open the repository selected by configuration.
pub async fn open_repository(
    config: &StorageAppConfig,
) -> Result<Arc<dyn PromptRepository>, StorageError> {
    let repo: Arc<dyn PromptRepository> = match config.backend {
        StorageBackend::Filesystem => Arc::new(
            filesystem::FilesystemPromptRepository::new(config.path.clone()).await?,
        ),
        StorageBackend::Memory => Arc::new(memory::MemoryPromptRepository::new()),
    };
    Ok(repo)
}
