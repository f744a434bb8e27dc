use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub use common::config::StorageAppConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// HS256 secret shared with the service that issues editor tokens.
    pub jwt_secret: String,
}

/// Default prompt texts written on first start when a kind has no versions.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SeedConfig {
    pub direct_system_prompt: Option<String>,
    pub planner_system_prompt: Option<String>,
    pub painter_system_prompt: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageAppConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("STUDIO_CONFIG").unwrap_or_else(|_| "config/config".to_string());

        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("storage.backend", "filesystem")?
            .set_default("storage.path", "./data/prompts")?
            .set_default("storage.duplicate_policy", "append")?
            .add_source(File::with_name(&config_path).required(false))
            // Override from environment (e.g., STUDIO__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("STUDIO").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
