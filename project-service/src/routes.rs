//! 路由模块

use axum::{routing::get, Router};
use crate::handlers;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_projects))
        .route("/comments", get(handlers::list_comments))
        .route("/api/health", get(handlers::health_check))
}

/// Mounts `api` under `root_path`; an empty prefix leaves it at the root.
pub fn with_root_path(api: Router<AppState>, root_path: &str) -> Router<AppState> {
    if root_path.is_empty() {
        api
    } else {
        Router::new().nest(root_path, api)
    }
}
