use axum::{
    Router,
    extract::{Query, State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;

use crate::{error::AppError, services::websocket_service, state::SharedState};

#[derive(Debug, Deserialize)]
/// Query parameters accepted by the WebSocket upgrade endpoint.
pub struct WsQuery {
    /// Session token issued at registration.
    pub token: String,
}

#[utoipa::path(
    get,
    path = "/ws",
    params(("token" = String, Query, description = "Session token issued at registration")),
    responses(
        (status = 101, description = "Switching protocols to WebSocket"),
        (status = 401, description = "Unknown or invalidated session token")
    )
)]
/// Upgrade the HTTP connection into a participant WebSocket session.
///
/// The token is checked against the registry before the upgrade completes so
/// an invalidated session never gets a socket at all.
pub async fn ws_handler(
    State(state): State<SharedState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, AppError> {
    if !state.registry().contains(&query.token) {
        return Err(AppError::Unauthorized("invalid session".into()));
    }

    let shared_state = state.clone();
    Ok(ws.on_upgrade(move |socket| {
        websocket_service::handle_socket(shared_state, socket, query.token)
    }))
}

/// Configure the WebSocket endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/ws", get(ws_handler))
}
