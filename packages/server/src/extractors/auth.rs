use axum::{extract::FromRequestParts, http::request::Parts};
use common::Actor;

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

pub const PROMPT_READ: &str = "prompt:read";
pub const PROMPT_WRITE: &str = "prompt:write";
pub const PROMPT_ACTIVATE: &str = "prompt:activate";

/// Editor identity extracted from the `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require authentication.
/// Permission checks happen via `require_permission()` in the handler body.
pub struct AuthUser {
    pub actor_id: String,
    pub username: String,
    pub permissions: Vec<String>,
}

impl AuthUser {
    /// Returns `Ok(())` if the user has the given permission, `Err(PermissionDenied)` otherwise.
    pub fn require_permission(&self, permission: &str) -> Result<(), AppError> {
        if self.permissions.iter().any(|p| p == permission) {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }

    /// The identity recorded on versions and pointer updates.
    pub fn actor(&self) -> Actor {
        Actor::new(&self.actor_id, &self.username)
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::TokenInvalid)?;

        let claims = jwt::verify(token, &state.config.auth.jwt_secret).map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            AppError::TokenInvalid
        })?;

        Ok(AuthUser {
            actor_id: claims.uid,
            username: claims.sub,
            permissions: claims.permissions,
        })
    }
}
