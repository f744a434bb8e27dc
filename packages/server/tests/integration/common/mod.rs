use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Duration;
use ::common::storage::filesystem::FilesystemPromptRepository;
use ::common::{DuplicatePolicy, PromptRegistry, StorageAppConfig, StorageBackend};
use reqwest::Client;
use serde_json::Value;
use tempfile::TempDir;

use server::config::{AppConfig, AuthConfig, CorsConfig, SeedConfig, ServerConfig};
use server::state::AppState;
use server::utils::jwt;

pub const JWT_SECRET: &str = "test-secret-for-integration-tests";

pub mod routes {
    pub fn versions(kind: &str) -> String {
        format!("/api/v1/prompts/{kind}/versions")
    }

    pub fn version(kind: &str, id: &str) -> String {
        format!("/api/v1/prompts/{kind}/versions/{id}")
    }

    pub fn active(kind: &str) -> String {
        format!("/api/v1/prompts/{kind}/active")
    }

    pub fn active_pack(kind: &str) -> String {
        format!("/api/v1/prompts/{kind}/active/pack")
    }

    pub const OPENAPI: &str = "/api-docs/openapi.json";
}

/// A running test server backed by a temporary filesystem repository.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub registry: Arc<PromptRegistry>,
    _data_dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestResponse {
    async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.expect("Failed to read response body");
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_policy(DuplicatePolicy::Append).await
    }

    pub async fn spawn_with_policy(duplicate_policy: DuplicatePolicy) -> Self {
        let data_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let storage_path = data_dir.path().join("prompts");

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            auth: AuthConfig {
                jwt_secret: JWT_SECRET.to_string(),
            },
            storage: StorageAppConfig {
                backend: StorageBackend::Filesystem,
                path: storage_path.clone(),
                duplicate_policy,
            },
            seed: SeedConfig::default(),
        };

        let repo = FilesystemPromptRepository::new(storage_path)
            .await
            .expect("Failed to open prompt repository");
        let registry = Arc::new(PromptRegistry::new(Arc::new(repo), duplicate_policy));

        let app = server::build_router(AppState {
            registry: registry.clone(),
            config: app_config,
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            registry,
            _data_dir: data_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Token for an editor holding every prompt permission.
    pub fn editor_token(&self, id: &str, username: &str) -> String {
        self.token_with(
            id,
            username,
            &["prompt:read", "prompt:write", "prompt:activate"],
        )
    }

    pub fn token_with(&self, id: &str, username: &str, permissions: &[&str]) -> String {
        jwt::sign(
            id,
            username,
            permissions.iter().map(|p| p.to_string()).collect(),
            Duration::hours(1),
            JWT_SECRET,
        )
        .expect("Failed to sign test token")
    }

    pub async fn post_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn put_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_without_token(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    /// Create a version and return its id.
    pub async fn create_version(&self, kind: &str, pack: Value, token: &str) -> String {
        let res = self
            .post_with_token(&routes::versions(kind), &serde_json::json!({ "pack": pack }), token)
            .await;
        assert_eq!(res.status, 201, "Create version failed: {}", res.text);

        res.body["version"]["versionId"]
            .as_str()
            .expect("versionId missing from response")
            .to_string()
    }
}
