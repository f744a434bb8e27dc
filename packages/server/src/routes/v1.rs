use utoipa_axum::{router::OpenApiRouter, routes};

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest("/prompts", prompt_routes())
}

fn prompt_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::prompt::list_versions,
            handlers::prompt::create_version
        ))
        .routes(routes!(handlers::prompt::get_version))
        .routes(routes!(handlers::prompt::get_active, handlers::prompt::activate))
        .routes(routes!(handlers::prompt::get_active_pack))
}
