//! Business logic powering the admin REST routes: lifecycle commands,
//! question-bank CRUD and participant management. Lifecycle commands are
//! serialized by the transition gate so two concurrent admin requests cannot
//! interleave their check-then-act sequences.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::models::NewQuestion,
    dto::{
        admin::{
            ActionResponse, EndGameResponse, ParticipantListItem, QuestionInput,
            QuestionResponse, StartGameResponse, TopRankedResponse,
        },
        game::GameStateDto,
    },
    error::ServiceError,
    services::{results_service, websocket_service},
    state::{
        SharedState, epoch_ms,
        lifecycle::{GameEvent, GamePhase},
        snapshot::QuestionSnapshot,
    },
};

/// Start the round: freeze the question snapshot and open the countdown.
///
/// Requires phase pending. The snapshot is captured from durable storage
/// before the transition is applied, so an empty question bank leaves the
/// phase untouched.
pub async fn start_game(
    state: &SharedState,
    started_by: &str,
) -> Result<StartGameResponse, ServiceError> {
    let _gate = state.transition_gate().lock().await;

    let phase = state.game_state().await.phase();
    if phase != GamePhase::Pending {
        return Err(ServiceError::InvalidState(format!(
            "game cannot be started from {phase:?}"
        )));
    }

    let store = state.require_quiz_store().await?;
    let questions = store.list_questions().await?;
    let snapshot = QuestionSnapshot::capture(questions);
    if snapshot.is_empty() {
        return Err(ServiceError::NoQuestions);
    }

    let start_at = epoch_ms() + state.config().start_buffer_ms();
    let total_questions = snapshot.len();

    let game = {
        let mut game = state.game().write().await;
        game.apply(GameEvent::Start {
            start_at,
            total_questions,
            started_by: started_by.to_owned(),
        })?;
        game.clone()
    };
    state
        .install_question_snapshot(Arc::new(snapshot))
        .await;

    info!(start_at, total_questions, "game started");
    websocket_service::broadcast_game_state(state).await;

    Ok(StartGameResponse {
        state: GameStateDto::from(&game),
        participant_count: state.registry().len(),
    })
}

/// End the round: close the phase, sweep results into storage and compute
/// the final leaderboard.
pub async fn end_game(
    state: &SharedState,
    ended_by: &str,
) -> Result<EndGameResponse, ServiceError> {
    let _gate = state.transition_gate().lock().await;

    let game = {
        let mut game = state.game().write().await;
        game.apply(GameEvent::End {
            ended_by: ended_by.to_owned(),
        })?;
        game.clone()
    };

    info!("game ended");
    websocket_service::broadcast_game_state(state).await;

    let persisted = results_service::persist_all(state).await?;
    let top = results_service::compute_top_ranked(state).await?;

    Ok(EndGameResponse {
        state: GameStateDto::from(&game),
        persisted,
        top,
    })
}

/// Current leaderboard without ending the round.
pub async fn top_ranked(state: &SharedState) -> Result<TopRankedResponse, ServiceError> {
    let top = results_service::compute_top_ranked(state).await?;
    Ok(TopRankedResponse { top })
}

/// Reset everything back to idle: game state, snapshot, sessions and
/// connections. Allowed from any phase as the admin escape hatch; every
/// outstanding session token is invalidated.
pub async fn reset_game(state: &SharedState) -> Result<ActionResponse, ServiceError> {
    let _gate = state.transition_gate().lock().await;
    reset_run(state).await?;
    Ok(ActionResponse {
        message: "game reset to idle".into(),
    })
}

async fn reset_run(state: &SharedState) -> Result<(), ServiceError> {
    {
        let mut game = state.game().write().await;
        game.apply(GameEvent::Reset)?;
    }
    state.clear_question_snapshot().await;
    state.registry().clear().await;
    websocket_service::broadcast_session_invalidated(state).await;
    warn!("game reset; all session tokens invalidated");
    Ok(())
}

/// List the question bank, correct answers included.
pub async fn list_questions(state: &SharedState) -> Result<Vec<QuestionResponse>, ServiceError> {
    let store = state.require_quiz_store().await?;
    let questions = store.list_questions().await?;
    Ok(questions.into_iter().map(QuestionResponse::from).collect())
}

/// Insert a question into the bank. Blocked while a round is running.
pub async fn create_question(
    state: &SharedState,
    input: QuestionInput,
) -> Result<QuestionResponse, ServiceError> {
    ensure_not_running(state, "edit questions").await?;

    let store = state.require_quiz_store().await?;
    let question = new_question(input);
    let id = store.create_question(question.clone()).await?;
    state.clear_question_snapshot().await;

    Ok(QuestionResponse {
        id,
        text: question.text,
        options: question.options,
        correct: question.correct,
        order_index: question.order_index,
    })
}

/// Replace a question's fields. Blocked while a round is running.
pub async fn update_question(
    state: &SharedState,
    id: Uuid,
    input: QuestionInput,
) -> Result<ActionResponse, ServiceError> {
    ensure_not_running(state, "edit questions").await?;

    let store = state.require_quiz_store().await?;
    let updated = store.update_question(id, new_question(input)).await?;
    if !updated {
        return Err(ServiceError::NotFound(format!("question `{id}` not found")));
    }
    state.clear_question_snapshot().await;

    Ok(ActionResponse {
        message: format!("question `{id}` updated"),
    })
}

/// Delete a question from the bank. Blocked while a round is running.
pub async fn delete_question(
    state: &SharedState,
    id: Uuid,
) -> Result<ActionResponse, ServiceError> {
    ensure_not_running(state, "edit questions").await?;

    let store = state.require_quiz_store().await?;
    let deleted = store.delete_question(id).await?;
    if !deleted {
        return Err(ServiceError::NotFound(format!("question `{id}` not found")));
    }
    state.clear_question_snapshot().await;

    Ok(ActionResponse {
        message: format!("question `{id}` deleted"),
    })
}

/// List every durable participant record, newest first.
pub async fn list_participants(
    state: &SharedState,
) -> Result<Vec<ParticipantListItem>, ServiceError> {
    let store = state.require_quiz_store().await?;
    let participants = store.list_participants().await?;
    Ok(participants
        .into_iter()
        .map(ParticipantListItem::from)
        .collect())
}

/// Delete every participant record and reset the run.
///
/// Blocked while a round is running; afterwards every session token is
/// invalidated so stale clients cannot resurrect deleted identities.
pub async fn delete_all_participants(
    state: &SharedState,
) -> Result<ActionResponse, ServiceError> {
    let _gate = state.transition_gate().lock().await;
    ensure_not_running(state, "delete participants").await?;

    let store = state.require_quiz_store().await?;
    store.delete_all_participants().await?;
    reset_run(state).await?;

    Ok(ActionResponse {
        message: "all participants deleted; game reset to idle".into(),
    })
}

/// Export every participant record, results included, as CSV.
pub async fn export_participants_csv(state: &SharedState) -> Result<String, ServiceError> {
    let store = state.require_quiz_store().await?;
    let participants = store.list_participants().await?;

    let mut csv = String::from(
        "id,firstName,lastName,nickName,phone,correctCount,wrongCount,durationMs\n",
    );
    for participant in participants {
        let row = ParticipantListItem::from(participant);
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{}\n",
            row.id,
            escape_csv(&row.first_name),
            escape_csv(&row.last_name),
            escape_csv(&row.nick_name),
            escape_csv(&row.phone),
            row.correct_count.map(|n| n.to_string()).unwrap_or_default(),
            row.wrong_count.map(|n| n.to_string()).unwrap_or_default(),
            row.duration_ms.map(|n| n.to_string()).unwrap_or_default(),
        ));
    }
    Ok(csv)
}

fn escape_csv(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_owned()
    }
}

fn new_question(input: QuestionInput) -> NewQuestion {
    NewQuestion {
        text: input.text,
        options: input.options,
        correct: input.correct,
        order_index: input.order_index,
    }
}

async fn ensure_not_running(state: &SharedState, action: &str) -> Result<(), ServiceError> {
    let phase = state.game_state().await.phase();
    if phase == GamePhase::Running {
        return Err(ServiceError::InvalidState(format!(
            "cannot {action} while a round is running"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dto::public::RegisterRequest,
        services::{registration_service, session_service, test_support::MemoryStore},
        state::AppState,
    };

    async fn state_with_store() -> SharedState {
        let state = AppState::new(AppConfig::default());
        state
            .set_quiz_store(Arc::new(MemoryStore::default()))
            .await;
        state
    }

    fn registration(nick: &str, phone: &str) -> RegisterRequest {
        RegisterRequest {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            nick_name: nick.into(),
            phone: phone.into(),
        }
    }

    fn question(order_index: u32) -> QuestionInput {
        QuestionInput {
            text: format!("question {order_index}"),
            options: vec!["yes".into(), "no".into()],
            correct: "yes".into(),
            order_index,
        }
    }

    #[tokio::test]
    async fn start_requires_pending_phase() {
        let state = AppState::new(AppConfig::default());
        let err = start_game(&state, "admin").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn end_requires_running_phase() {
        let state = AppState::new(AppConfig::default());
        let err = end_game(&state, "admin").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn reset_returns_to_idle_and_invalidates_sessions() {
        let state = AppState::new(AppConfig::default());
        state.registry().register("tok".into(), Uuid::new_v4()).await;
        {
            let mut game = state.game().write().await;
            game.apply(GameEvent::FirstRegistration).unwrap();
        }

        reset_game(&state).await.unwrap();
        assert_eq!(state.game_state().await.phase(), GamePhase::Idle);
        assert!(state.registry().is_empty());
        assert!(state.question_snapshot().await.is_none());
    }

    #[tokio::test]
    async fn question_edits_are_blocked_while_running() {
        let state = AppState::new(AppConfig::default());
        {
            let mut game = state.game().write().await;
            game.apply(GameEvent::FirstRegistration).unwrap();
            game.apply(GameEvent::Start {
                start_at: epoch_ms(),
                total_questions: 1,
                started_by: "admin".into(),
            })
            .unwrap();
        }

        let input = QuestionInput {
            text: "q".into(),
            options: vec!["a".into(), "b".into()],
            correct: "a".into(),
            order_index: 1,
        };
        let err = create_question(&state, input).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[test]
    fn csv_fields_are_escaped() {
        assert_eq!(escape_csv("plain"), "plain");
        assert_eq!(escape_csv("a,b"), "\"a,b\"");
        assert_eq!(escape_csv("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[tokio::test]
    async fn start_with_empty_bank_leaves_phase_untouched() {
        let state = state_with_store().await;
        registration_service::register(&state, registration("ada", "5550000001"))
            .await
            .unwrap();

        let err = start_game(&state, "admin").await.unwrap_err();
        assert!(matches!(err, ServiceError::NoQuestions));
        assert_eq!(state.game_state().await.phase(), GamePhase::Pending);
    }

    #[tokio::test]
    async fn duplicate_phone_is_rejected_with_field_name() {
        let state = state_with_store().await;
        registration_service::register(&state, registration("ada", "5550000001"))
            .await
            .unwrap();

        let err = registration_service::register(&state, registration("grace", "5550000001"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::DuplicateContact { field: "phone" }
        ));
    }

    #[tokio::test]
    async fn full_round_ranks_and_persists_results() {
        let state = state_with_store().await;
        create_question(&state, question(1)).await.unwrap();
        create_question(&state, question(2)).await.unwrap();

        let winner = registration_service::register(&state, registration("ada", "5550000001"))
            .await
            .unwrap();
        let flawed = registration_service::register(&state, registration("grace", "5550000002"))
            .await
            .unwrap();

        let started = start_game(&state, "admin").await.unwrap();
        assert_eq!(started.participant_count, 2);
        assert_eq!(state.game_state().await.phase(), GamePhase::Running);

        // Perfect run for the winner, one wrong answer for the other.
        for token in [&winner.session_token, &flawed.session_token] {
            session_service::connect_messages(&state, token).await.unwrap();
        }
        session_service::answer_messages(&state, &winner.session_token, "yes")
            .await
            .unwrap();
        session_service::answer_messages(&state, &winner.session_token, "yes")
            .await
            .unwrap();
        session_service::answer_messages(&state, &flawed.session_token, "no")
            .await
            .unwrap();
        session_service::answer_messages(&state, &flawed.session_token, "yes")
            .await
            .unwrap();

        let ended = end_game(&state, "admin").await.unwrap();
        assert_eq!(state.game_state().await.phase(), GamePhase::Finished);
        assert_eq!(ended.persisted, 2);
        assert_eq!(ended.top.len(), 1);
        assert_eq!(ended.top[0].rank, 1);
        assert_eq!(ended.top[0].nick_name, "ada");
        assert!(ended.top[0].duration_ms >= 1);

        // Results were committed into the durable records.
        let listing = list_participants(&state).await.unwrap();
        let flawed_row = listing.iter().find(|p| p.nick_name == "grace").unwrap();
        assert_eq!(flawed_row.correct_count, Some(1));
        assert_eq!(flawed_row.wrong_count, Some(1));

        // Registration is closed once finished.
        let err = registration_service::register(&state, registration("late", "5550000003"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::RegistrationClosed));
    }
}
