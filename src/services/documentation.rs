use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Quiz Rush Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::public::register,
        crate::routes::websocket::ws_handler,
        crate::routes::admin::start_game,
        crate::routes::admin::end_game,
        crate::routes::admin::reset_game,
        crate::routes::admin::top_ranked,
        crate::routes::admin::list_questions,
        crate::routes::admin::create_question,
        crate::routes::admin::update_question,
        crate::routes::admin::delete_question,
        crate::routes::admin::list_participants,
        crate::routes::admin::delete_all_participants,
        crate::routes::admin::export_participants,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::public::RegisterRequest,
            crate::dto::public::RegisterResponse,
            crate::dto::game::PhaseDto,
            crate::dto::game::GameStateDto,
            crate::dto::ws::ClientMessage,
            crate::dto::ws::ServerMessage,
            crate::dto::ws::PublicQuestion,
            crate::state::registry::AnswerRecord,
            crate::dto::admin::ActionResponse,
            crate::dto::admin::StartGameResponse,
            crate::dto::admin::EndGameResponse,
            crate::dto::admin::TopRankedResponse,
            crate::dto::admin::RankedEntry,
            crate::dto::admin::QuestionInput,
            crate::dto::admin::QuestionResponse,
            crate::dto::admin::ParticipantListItem,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "public", description = "Participant registration"),
        (name = "admin", description = "Game lifecycle, question bank and participant management"),
    )
)]
pub struct ApiDoc;
