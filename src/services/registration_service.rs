//! Participant registration: durable record creation, session issuance and
//! the idle → pending lifecycle nudge.

use tracing::info;

use crate::{
    dao::models::NewParticipant,
    dto::public::{RegisterRequest, RegisterResponse},
    error::ServiceError,
    services::websocket_service,
    state::{
        SharedState,
        lifecycle::{GameEvent, GamePhase},
        registry::generate_session_token,
    },
};

/// Register a participant and mint their session token.
///
/// The durable record is created first so the unique phone constraint is
/// enforced before a session exists. The first successful registration moves
/// the game from idle to pending, which is broadcast to connected clients.
pub async fn register(
    state: &SharedState,
    request: RegisterRequest,
) -> Result<RegisterResponse, ServiceError> {
    let game = state.game_state().await;
    if game.phase() == GamePhase::Finished {
        return Err(ServiceError::RegistrationClosed);
    }

    let store = state.require_quiz_store().await?;
    let participant_id = store
        .create_participant(NewParticipant {
            first_name: request.first_name,
            last_name: request.last_name,
            nick_name: request.nick_name,
            phone: request.phone,
        })
        .await?;

    let session_token = generate_session_token();
    state
        .registry()
        .register(session_token.clone(), participant_id)
        .await;

    // Late joiners during a running round stay pending until contacted; only
    // an idle game moves to pending here.
    let became_pending = {
        let mut game = state.game().write().await;
        if game.phase() == GamePhase::Idle {
            game.apply(GameEvent::FirstRegistration)?;
            true
        } else {
            false
        }
    };

    if became_pending {
        info!("first registration received; game is now pending");
        websocket_service::broadcast_game_state(state).await;
    }

    info!(participant_id = %participant_id, "participant registered");
    Ok(RegisterResponse { session_token })
}
