//! Session protocol logic: derives the ordered list of messages owed to a
//! participant for each connection event, resync, answer and legacy finish.
//!
//! Every function re-reads the shared state on entry and returns the messages
//! to emit instead of pushing them itself, so the socket adapter stays a thin
//! transport shim and the protocol is testable without a live connection.

use tracing::debug;

use crate::{
    dto::{
        game::GameStateDto,
        ws::{PublicQuestion, ServerMessage},
    },
    error::ServiceError,
    state::{
        SharedState, epoch_ms,
        lifecycle::GamePhase,
        registry::{AnswerOutcome, ParticipantProgress, ParticipantStatus},
    },
};

/// Messages owed to a participant on initial connect.
///
/// Always leads with the game-state snapshot. A finished participant gets
/// their final summary back immediately so a page refresh cannot demote them
/// to a waiting screen; an unfinished one gets the question at their cursor
/// while a round is running.
pub async fn connect_messages(
    state: &SharedState,
    token: &str,
) -> Result<Vec<ServerMessage>, ServiceError> {
    let game = state.game_state().await;
    let mut messages = vec![ServerMessage::GameState(GameStateDto::from(&game))];

    let progress = state
        .registry()
        .lookup(token)
        .ok_or(ServiceError::InvalidSession)?;

    if progress.status == ParticipantStatus::Done {
        messages.push(done_summary(&progress));
        return Ok(messages);
    }

    if game.phase() == GamePhase::Running {
        if let Some(message) = enter_running(state, token).await? {
            messages.push(message);
        }
    }

    Ok(messages)
}

/// Messages owed in response to an explicit resync request.
///
/// Same derivation as initial connect; safe to repeat at any time.
pub async fn sync_messages(
    state: &SharedState,
    token: &str,
) -> Result<Vec<ServerMessage>, ServiceError> {
    connect_messages(state, token).await
}

/// Apply one answer submission and derive the response messages.
///
/// Submissions outside a running round, past the end of the snapshot, or from
/// a finished participant are silently absorbed. The grading and cursor bump
/// run as one atomic read-modify-write, so a duplicate frame observes the
/// already-advanced cursor and falls into the absorbed case.
pub async fn answer_messages(
    state: &SharedState,
    token: &str,
    answer: &str,
) -> Result<Vec<ServerMessage>, ServiceError> {
    let game = state.game_state().await;
    if game.phase() != GamePhase::Running {
        return Ok(Vec::new());
    }

    let snapshot = state
        .question_snapshot()
        .await
        .ok_or_else(|| ServiceError::InvalidState("no question snapshot captured".into()))?;
    let total = game.total_questions().unwrap_or_else(|| snapshot.len());
    let now = epoch_ms();

    let (outcome, progress) = state
        .registry()
        .with_progress_mut(token, |progress| {
            progress.mark_in_game(now);
            let outcome = progress.apply_answer(&snapshot, total, answer, now);
            (outcome, progress.clone())
        })
        .ok_or(ServiceError::InvalidSession)?;

    match outcome {
        AnswerOutcome::Ignored => {
            debug!("absorbed answer submission (done or out of range)");
            Ok(Vec::new())
        }
        AnswerOutcome::Advanced {
            correct,
            next_index,
        } => {
            let Some(next) = snapshot.get(next_index) else {
                return Ok(Vec::new());
            };
            Ok(vec![
                ServerMessage::QuestionCurrent {
                    index: next_index,
                    question: PublicQuestion::from(next),
                },
                ServerMessage::AnswerAck {
                    correct,
                    correct_count: progress.correct_count,
                    wrong_count: progress.wrong_count,
                    done: false,
                },
            ])
        }
        AnswerOutcome::Finished {
            correct: _,
            duration_ms,
        } => Ok(vec![
            ServerMessage::FinishAck {
                done: true,
                duration_ms: Some(duration_ms),
                answers: Some(progress.answers.clone()),
                error: None,
            },
            done_summary(&progress),
        ]),
    }
}

/// Handle the legacy explicit finish request.
///
/// Auto-finish on the last answer made this redundant, but older clients
/// still send it: a finished participant gets their summary back, one that
/// has answered everything is finished now, and anyone mid-run gets a
/// rejection ack.
pub async fn finish_messages(
    state: &SharedState,
    token: &str,
) -> Result<Vec<ServerMessage>, ServiceError> {
    enum FinishVerdict {
        AlreadyDone,
        Incomplete,
        Completed,
    }

    let game = state.game_state().await;
    if game.phase() != GamePhase::Running {
        return Ok(Vec::new());
    }

    let snapshot = state
        .question_snapshot()
        .await
        .ok_or_else(|| ServiceError::InvalidState("no question snapshot captured".into()))?;
    let total = game.total_questions().unwrap_or_else(|| snapshot.len());
    let now = epoch_ms();

    // Guard and transition run as one atomic read-modify-write, so a
    // duplicate finish frame from a stale connection observes Done instead
    // of re-running the transition.
    let (verdict, progress) = state
        .registry()
        .with_progress_mut(token, |progress| {
            let verdict = if progress.status == ParticipantStatus::Done {
                FinishVerdict::AlreadyDone
            } else if progress.question_index < total {
                FinishVerdict::Incomplete
            } else {
                progress.finish(now);
                FinishVerdict::Completed
            };
            (verdict, progress.clone())
        })
        .ok_or(ServiceError::InvalidSession)?;

    match verdict {
        FinishVerdict::AlreadyDone => Ok(vec![done_summary(&progress)]),
        FinishVerdict::Incomplete => Ok(vec![ServerMessage::FinishAck {
            done: false,
            duration_ms: None,
            answers: None,
            error: Some("Questions not completed".into()),
        }]),
        FinishVerdict::Completed => Ok(vec![
            ServerMessage::FinishAck {
                done: true,
                duration_ms: Some(progress.duration_ms.unwrap_or(1)),
                answers: Some(progress.answers.clone()),
                error: None,
            },
            done_summary(&progress),
        ]),
    }
}

/// Flip the session to in-game and fetch the question at its cursor.
async fn enter_running(
    state: &SharedState,
    token: &str,
) -> Result<Option<ServerMessage>, ServiceError> {
    let snapshot = state
        .question_snapshot()
        .await
        .ok_or_else(|| ServiceError::InvalidState("no question snapshot captured".into()))?;
    let now = epoch_ms();

    let progress = state
        .registry()
        .with_progress_mut(token, |progress| {
            progress.mark_in_game(now);
            progress.clone()
        })
        .ok_or(ServiceError::InvalidSession)?;

    Ok(snapshot
        .get(progress.question_index)
        .map(|question| ServerMessage::QuestionCurrent {
            index: progress.question_index,
            question: PublicQuestion::from(question),
        }))
}

fn done_summary(progress: &ParticipantProgress) -> ServerMessage {
    ServerMessage::PlayerDone {
        correct_count: progress.correct_count,
        wrong_count: progress.wrong_count,
        duration_ms: progress.duration_ms.unwrap_or_default(),
        answers: progress.answers.clone(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        dto::game::PhaseDto,
        state::{
            AppState,
            lifecycle::GameEvent,
            snapshot::QuestionSnapshot,
        },
    };

    async fn running_state(total: usize) -> SharedState {
        let state = AppState::new(AppConfig::default());
        state.registry().register("tok".into(), Uuid::new_v4()).await;
        {
            let mut game = state.game().write().await;
            game.apply(GameEvent::FirstRegistration).unwrap();
            game.apply(GameEvent::Start {
                start_at: epoch_ms(),
                total_questions: total,
                started_by: "admin".into(),
            })
            .unwrap();
        }
        state
            .install_question_snapshot(Arc::new(QuestionSnapshot::fixture(total)))
            .await;
        state
    }

    #[tokio::test]
    async fn connect_while_idle_only_reports_game_state() {
        let state = AppState::new(AppConfig::default());
        state.registry().register("tok".into(), Uuid::new_v4()).await;

        let messages = connect_messages(&state, "tok").await.unwrap();
        assert_eq!(messages.len(), 1);
        let ServerMessage::GameState(dto) = &messages[0] else {
            panic!("expected game state first");
        };
        assert_eq!(dto.state, PhaseDto::Idle);
    }

    #[tokio::test]
    async fn connect_rejects_unknown_tokens() {
        let state = AppState::new(AppConfig::default());
        let err = connect_messages(&state, "nope").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidSession));
    }

    #[tokio::test]
    async fn connect_while_running_serves_question_at_cursor() {
        let state = running_state(2).await;

        let messages = connect_messages(&state, "tok").await.unwrap();
        assert_eq!(messages.len(), 2);
        assert!(matches!(
            &messages[1],
            ServerMessage::QuestionCurrent { index: 0, .. }
        ));

        let progress = state.registry().lookup("tok").unwrap();
        assert_eq!(progress.status, ParticipantStatus::InGame);
        assert!(progress.joined_at.is_some());
    }

    #[tokio::test]
    async fn resync_is_idempotent_and_keeps_joined_at() {
        let state = running_state(2).await;

        connect_messages(&state, "tok").await.unwrap();
        let joined = state.registry().lookup("tok").unwrap().joined_at;

        let again = sync_messages(&state, "tok").await.unwrap();
        assert_eq!(again.len(), 2);
        assert_eq!(state.registry().lookup("tok").unwrap().joined_at, joined);
    }

    #[tokio::test]
    async fn wrong_answer_acks_and_advances() {
        let state = running_state(2).await;
        connect_messages(&state, "tok").await.unwrap();

        let messages = answer_messages(&state, "tok", "definitely wrong").await.unwrap();
        assert!(matches!(
            &messages[0],
            ServerMessage::QuestionCurrent { index: 1, .. }
        ));
        assert!(matches!(
            &messages[1],
            ServerMessage::AnswerAck {
                correct: false,
                correct_count: 0,
                wrong_count: 1,
                done: false,
            }
        ));
    }

    #[tokio::test]
    async fn last_answer_finishes_and_reports_summary() {
        let state = running_state(1).await;
        connect_messages(&state, "tok").await.unwrap();

        let messages = answer_messages(&state, "tok", "a").await.unwrap();
        assert!(matches!(
            &messages[0],
            ServerMessage::FinishAck { done: true, .. }
        ));
        assert!(matches!(&messages[1], ServerMessage::PlayerDone { .. }));

        // A duplicate of the final frame is absorbed without output.
        let duplicate = answer_messages(&state, "tok", "a").await.unwrap();
        assert!(duplicate.is_empty());
        let progress = state.registry().lookup("tok").unwrap();
        assert_eq!(progress.correct_count, 1);
        assert_eq!(progress.wrong_count, 0);
    }

    #[tokio::test]
    async fn answers_outside_running_are_absorbed() {
        let state = AppState::new(AppConfig::default());
        state.registry().register("tok".into(), Uuid::new_v4()).await;

        let messages = answer_messages(&state, "tok", "a").await.unwrap();
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn premature_finish_is_rejected() {
        let state = running_state(2).await;
        connect_messages(&state, "tok").await.unwrap();
        answer_messages(&state, "tok", "a").await.unwrap();

        let messages = finish_messages(&state, "tok").await.unwrap();
        assert!(matches!(
            &messages[0],
            ServerMessage::FinishAck {
                done: false,
                error: Some(_),
                ..
            }
        ));
        assert_eq!(
            state.registry().lookup("tok").unwrap().status,
            ParticipantStatus::InGame
        );
    }

    #[tokio::test]
    async fn finish_after_done_repeats_the_summary() {
        let state = running_state(1).await;
        connect_messages(&state, "tok").await.unwrap();
        answer_messages(&state, "tok", "a").await.unwrap();

        let messages = finish_messages(&state, "tok").await.unwrap();
        assert_eq!(messages.len(), 1);
        assert!(matches!(&messages[0], ServerMessage::PlayerDone { .. }));
    }

    #[tokio::test]
    async fn repeated_finish_keeps_completion_fields() {
        let state = running_state(1).await;
        connect_messages(&state, "tok").await.unwrap();
        answer_messages(&state, "tok", "a").await.unwrap();
        let before = state.registry().lookup("tok").unwrap();

        // A late duplicate from a stale reconnect must not rewrite the
        // frozen completion fields.
        finish_messages(&state, "tok").await.unwrap();
        finish_messages(&state, "tok").await.unwrap();

        let after = state.registry().lookup("tok").unwrap();
        assert_eq!(after.finished_at, before.finished_at);
        assert_eq!(after.duration_ms, before.duration_ms);
        assert_eq!(after.correct_count, before.correct_count);
    }
}
