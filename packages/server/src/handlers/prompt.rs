use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use common::{ActiveRef, ActiveState, PromptVersion, VersionId};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{AuthUser, PROMPT_ACTIVATE, PROMPT_READ, PROMPT_WRITE};
use crate::extractors::json::AppJson;
use crate::models::prompt::{
    ActivateRequest, CreateVersionRequest, CreateVersionResponse, VersionListResponse,
    parse_kind, validate_create_request,
};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/{kind}/versions",
    tag = "Prompts",
    operation_id = "listPromptVersions",
    summary = "List prompt versions",
    description = "Returns version metadata for a pack kind, newest first. Pack content is omitted; fetch a single version for it. Requires `prompt:read` permission.",
    params(("kind" = String, Path, description = "Pack kind: `direct` or `workflow`")),
    responses(
        (status = 200, description = "Version history", body = VersionListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown pack kind (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(username = %auth_user.username))]
pub async fn list_versions(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<VersionListResponse>, AppError> {
    auth_user.require_permission(PROMPT_READ)?;
    let kind = parse_kind(&kind)?;

    let data = state.registry.list_versions(kind).await?;

    Ok(Json(VersionListResponse { kind, data }))
}

#[utoipa::path(
    post,
    path = "/{kind}/versions",
    tag = "Prompts",
    operation_id = "createPromptVersion",
    summary = "Create a prompt version",
    description = "Appends an immutable version of the submitted pack. With `activate: true` the new version also becomes live. Requires `prompt:write` permission, plus `prompt:activate` when activating.",
    params(("kind" = String, Path, description = "Pack kind: `direct` or `workflow`")),
    request_body = CreateVersionRequest,
    responses(
        (status = 201, description = "Version created", body = CreateVersionResponse),
        (status = 400, description = "Invalid pack (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown pack kind (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(username = %auth_user.username, activate = payload.activate))]
pub async fn create_version(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(kind): Path<String>,
    AppJson(payload): AppJson<CreateVersionRequest>,
) -> Result<(StatusCode, Json<CreateVersionResponse>), AppError> {
    auth_user.require_permission(PROMPT_WRITE)?;
    if payload.activate {
        auth_user.require_permission(PROMPT_ACTIVATE)?;
    }
    let kind = parse_kind(&kind)?;
    validate_create_request(kind, &payload)?;

    let response = if payload.activate {
        let (version, active) = state
            .registry
            .create_and_activate(payload.pack, auth_user.actor(), payload.note)
            .await?;
        CreateVersionResponse {
            version,
            active: Some(active),
        }
    } else {
        let version = state
            .registry
            .create_version(payload.pack, auth_user.actor(), payload.note)
            .await?;
        CreateVersionResponse {
            version,
            active: None,
        }
    };

    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/{kind}/versions/{version_id}",
    tag = "Prompts",
    operation_id = "getPromptVersion",
    summary = "Get a prompt version",
    description = "Returns a single version including its pack content. Requires `prompt:read` permission.",
    params(
        ("kind" = String, Path, description = "Pack kind: `direct` or `workflow`"),
        ("version_id" = String, Path, description = "Version ID"),
    ),
    responses(
        (status = 200, description = "Version details", body = PromptVersion),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Version not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(username = %auth_user.username))]
pub async fn get_version(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((kind, version_id)): Path<(String, String)>,
) -> Result<Json<PromptVersion>, AppError> {
    auth_user.require_permission(PROMPT_READ)?;
    let kind = parse_kind(&kind)?;

    let version = state
        .registry
        .get_version(kind, &VersionId::from(version_id))
        .await?;

    Ok(Json(version))
}

#[utoipa::path(
    get,
    path = "/{kind}/active",
    tag = "Prompts",
    operation_id = "getActivePrompt",
    summary = "Get the active pointer",
    description = "Returns `{\"state\":\"unset\"}` until a version of this kind has been activated, otherwise the pointer with its audit fields. Requires `prompt:read` permission.",
    params(("kind" = String, Path, description = "Pack kind: `direct` or `workflow`")),
    responses(
        (status = 200, description = "Pointer state: `{\"state\":\"unset\"}` or `{\"state\":\"active\"}` merged with the ActiveRef fields", body = serde_json::Value),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown pack kind (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(username = %auth_user.username))]
pub async fn get_active(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<ActiveState>, AppError> {
    auth_user.require_permission(PROMPT_READ)?;
    let kind = parse_kind(&kind)?;

    Ok(Json(state.registry.get_active(kind).await?))
}

#[utoipa::path(
    put,
    path = "/{kind}/active",
    tag = "Prompts",
    operation_id = "activatePromptVersion",
    summary = "Activate a prompt version",
    description = "Points the pack kind at an existing version. Activating the current version again refreshes the audit fields. Requires `prompt:activate` permission.",
    params(("kind" = String, Path, description = "Pack kind: `direct` or `workflow`")),
    request_body = ActivateRequest,
    responses(
        (status = 200, description = "Pointer updated", body = ActiveRef),
        (status = 400, description = "Malformed body (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown pack kind (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Version does not exist (UNKNOWN_VERSION)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(username = %auth_user.username, version_id = %payload.version_id))]
pub async fn activate(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(kind): Path<String>,
    AppJson(payload): AppJson<ActivateRequest>,
) -> Result<Json<ActiveRef>, AppError> {
    auth_user.require_permission(PROMPT_ACTIVATE)?;
    let kind = parse_kind(&kind)?;

    let active = state
        .registry
        .activate(kind, &VersionId::from(payload.version_id), auth_user.actor())
        .await?;

    Ok(Json(active))
}

#[utoipa::path(
    get,
    path = "/{kind}/active/pack",
    tag = "Prompts",
    operation_id = "getActivePromptPack",
    summary = "Get the live prompt version",
    description = "Resolves the active pointer to the full version, as consumed by the generation features. Requires `prompt:read` permission.",
    params(("kind" = String, Path, description = "Pack kind: `direct` or `workflow`")),
    responses(
        (status = 200, description = "Live version", body = PromptVersion),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown kind or no active version (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(username = %auth_user.username))]
pub async fn get_active_pack(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<PromptVersion>, AppError> {
    auth_user.require_permission(PROMPT_READ)?;
    let kind = parse_kind(&kind)?;

    let version = state
        .registry
        .get_active_pack(kind)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No active {kind} prompt version")))?;

    Ok(Json(version))
}
