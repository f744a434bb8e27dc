use std::sync::Arc;

use common::PromptRegistry;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<PromptRegistry>,
    pub config: AppConfig,
}
