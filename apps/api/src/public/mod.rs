//! Unauthenticated API used by the public onboarding flow.

pub mod countries;
pub mod handlers;
pub mod schemas;
pub mod service;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// `max_upload_bytes` bounds the document upload body only.
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/dependencies", get(handlers::handle_dependencies))
        .route("/crawl", post(handlers::handle_crawl))
        .route("/classify", post(handlers::handle_classify))
        .route("/policy", post(handlers::handle_create_policy))
        .route("/documents/:id", get(handlers::handle_get_document))
        .route(
            "/companies/:id/documents",
            get(handlers::handle_list_documents)
                .post(handlers::handle_upload_document)
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
}
