pub mod downloads;
pub mod health;

use axum::{routing::get, Router};
use tower_http::services::ServeDir;

use crate::public;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let static_dir = ServeDir::new(&state.config.static_dir);
    Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler))
        .nest("/public", public::router(state.config.max_upload_bytes))
        .route(
            "/downloads/documents/:id",
            get(downloads::handle_download_document),
        )
        .nest_service("/static", static_dir)
        .with_state(state)
}
