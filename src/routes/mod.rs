use axum::Router;

use crate::state::SharedState;

/// Token-guarded admin surface.
pub mod admin;
/// Swagger UI and OpenAPI document routes.
pub mod docs;
/// Health check route.
pub mod health;
/// Public participant registration route.
pub mod public;
/// WebSocket upgrade route.
pub mod websocket;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(public::router())
        .merge(websocket::router())
        .merge(admin::router(state.clone()));

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
