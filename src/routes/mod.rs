use axum::Router;
use tower_http::services::ServeDir;

use crate::state::SharedState;

pub mod admin;
pub mod auth;
pub mod docs;
pub mod health;
pub mod quiz;
pub mod upload;
pub mod websocket;

/// Compose all route trees, wiring in shared state, uploads and documentation.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(auth::router())
        .merge(quiz::router(state.clone()))
        .merge(admin::router(state.clone()))
        .merge(upload::router(state.clone()))
        .merge(websocket::router());

    let docs_router = docs::router(state.clone());
    let uploads_router =
        Router::new().nest_service("/uploads", ServeDir::new(state.config().upload_dir()));

    api_router
        .merge(docs_router)
        .merge(uploads_router)
        .with_state(state)
}
