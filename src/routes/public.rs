use axum::{Json, Router, extract::State, routing::post};
use axum_valid::Valid;

use crate::{
    dto::public::{RegisterRequest, RegisterResponse},
    error::AppError,
    services::registration_service,
    state::SharedState,
};

/// Register a participant and receive a session token.
#[utoipa::path(
    post,
    path = "/register",
    tag = "public",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Participant registered", body = RegisterResponse),
        (status = 400, description = "Validation failure, duplicate phone, or registration closed")
    )
)]
pub async fn register(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<RegisterRequest>>,
) -> Result<Json<RegisterResponse>, AppError> {
    Ok(Json(registration_service::register(&state, payload).await?))
}

/// Configure the public registration subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/register", post(register))
}
