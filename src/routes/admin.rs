use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{Request, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::admin::{
        ActionResponse, EndGameResponse, ParticipantListItem, QuestionInput, QuestionResponse,
        StartGameResponse, TopRankedResponse,
    },
    error::AppError,
    services::admin_service,
    state::SharedState,
};

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Operator identity recorded in the lifecycle audit fields.
const ADMIN_OPERATOR: &str = "admin";

/// Admin-only management endpoints for driving the game lifecycle, the
/// question bank, and participant records.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/admin/game/start", post(start_game))
        .route("/admin/game/end", post(end_game))
        .route("/admin/game/reset", post(reset_game))
        .route("/admin/game/top", get(top_ranked))
        .route("/admin/questions", get(list_questions).post(create_question))
        .route(
            "/admin/questions/{id}",
            put(update_question).delete(delete_question),
        )
        .route(
            "/admin/participants",
            get(list_participants).delete(delete_all_participants),
        )
        .route("/admin/participants/export", get(export_participants))
        .route_layer(middleware::from_fn_with_state(state, require_admin_token))
}

/// Start the pending round and open the synchronized countdown.
#[utoipa::path(
    post,
    path = "/admin/game/start",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Shared admin token")),
    responses(
        (status = 200, description = "Game started", body = StartGameResponse),
        (status = 409, description = "Game is not pending or the question bank is empty")
    )
)]
pub async fn start_game(
    State(state): State<SharedState>,
) -> Result<Json<StartGameResponse>, AppError> {
    Ok(Json(
        admin_service::start_game(&state, ADMIN_OPERATOR).await?,
    ))
}

/// End the running round, persist results and return the leaderboard.
#[utoipa::path(
    post,
    path = "/admin/game/end",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Shared admin token")),
    responses(
        (status = 200, description = "Game ended", body = EndGameResponse),
        (status = 409, description = "Game is not running")
    )
)]
pub async fn end_game(State(state): State<SharedState>) -> Result<Json<EndGameResponse>, AppError> {
    Ok(Json(admin_service::end_game(&state, ADMIN_OPERATOR).await?))
}

/// Reset the game to idle, wiping all sessions.
#[utoipa::path(
    post,
    path = "/admin/game/reset",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Shared admin token")),
    responses((status = 200, description = "Game reset", body = ActionResponse))
)]
pub async fn reset_game(State(state): State<SharedState>) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(admin_service::reset_game(&state).await?))
}

/// Current leaderboard of the fastest perfect runs.
#[utoipa::path(
    get,
    path = "/admin/game/top",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Shared admin token")),
    responses((status = 200, description = "Leaderboard", body = TopRankedResponse))
)]
pub async fn top_ranked(
    State(state): State<SharedState>,
) -> Result<Json<TopRankedResponse>, AppError> {
    Ok(Json(admin_service::top_ranked(&state).await?))
}

/// List the question bank, correct answers included.
#[utoipa::path(
    get,
    path = "/admin/questions",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Shared admin token")),
    responses((status = 200, description = "Question bank", body = [QuestionResponse]))
)]
pub async fn list_questions(
    State(state): State<SharedState>,
) -> Result<Json<Vec<QuestionResponse>>, AppError> {
    Ok(Json(admin_service::list_questions(&state).await?))
}

/// Add a question to the bank.
#[utoipa::path(
    post,
    path = "/admin/questions",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Shared admin token")),
    request_body = QuestionInput,
    responses(
        (status = 200, description = "Question created", body = QuestionResponse),
        (status = 409, description = "A round is running")
    )
)]
pub async fn create_question(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<QuestionInput>>,
) -> Result<Json<QuestionResponse>, AppError> {
    Ok(Json(admin_service::create_question(&state, payload).await?))
}

/// Replace a question's fields.
#[utoipa::path(
    put,
    path = "/admin/questions/{id}",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Shared admin token"),
    ("id" = String, Path, description = "Identifier of the question to update")),
    request_body = QuestionInput,
    responses(
        (status = 200, description = "Question updated", body = ActionResponse),
        (status = 404, description = "Unknown question id")
    )
)]
pub async fn update_question(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<QuestionInput>>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(
        admin_service::update_question(&state, id, payload).await?,
    ))
}

/// Delete a question from the bank.
#[utoipa::path(
    delete,
    path = "/admin/questions/{id}",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Shared admin token"),
    ("id" = String, Path, description = "Identifier of the question to delete")),
    responses(
        (status = 200, description = "Question deleted", body = ActionResponse),
        (status = 404, description = "Unknown question id")
    )
)]
pub async fn delete_question(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(admin_service::delete_question(&state, id).await?))
}

/// List every registered participant, persisted results included.
#[utoipa::path(
    get,
    path = "/admin/participants",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Shared admin token")),
    responses((status = 200, description = "Participant records", body = [ParticipantListItem]))
)]
pub async fn list_participants(
    State(state): State<SharedState>,
) -> Result<Json<Vec<ParticipantListItem>>, AppError> {
    Ok(Json(admin_service::list_participants(&state).await?))
}

/// Delete every participant record and reset the game.
#[utoipa::path(
    delete,
    path = "/admin/participants",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Shared admin token")),
    responses(
        (status = 200, description = "Participants deleted", body = ActionResponse),
        (status = 409, description = "A round is running")
    )
)]
pub async fn delete_all_participants(
    State(state): State<SharedState>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(admin_service::delete_all_participants(&state).await?))
}

/// Export participant records, results included, as CSV.
#[utoipa::path(
    get,
    path = "/admin/participants/export",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Shared admin token")),
    responses((status = 200, description = "CSV export", content_type = "text/csv"))
)]
pub async fn export_participants(
    State(state): State<SharedState>,
) -> Result<Response, AppError> {
    let csv = admin_service::export_participants_csv(&state).await?;
    Ok(([(header::CONTENT_TYPE, "text/csv")], csv).into_response())
}

async fn require_admin_token(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_owned())
        .ok_or_else(|| {
            AppError::Unauthorized("missing admin token header `X-Admin-Token`".into())
        })?;

    match state.config().admin_token() {
        Some(token) if token == provided => Ok(next.run(req).await),
        Some(_) => Err(AppError::Unauthorized("invalid admin token".into())),
        None => Err(AppError::Unauthorized(
            "admin token not configured on the server".into(),
        )),
    }
}
