use serde::Serialize;
use utoipa::ToSchema;

use crate::state::lifecycle::{GamePhase, GameState};

/// Wire representation of the global game phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseDto {
    /// No participants yet.
    Idle,
    /// Waiting for the admin start command.
    Pending,
    /// A round is in progress.
    Running,
    /// The round has been closed.
    Finished,
}

impl From<GamePhase> for PhaseDto {
    fn from(value: GamePhase) -> Self {
        match value {
            GamePhase::Idle => PhaseDto::Idle,
            GamePhase::Pending => PhaseDto::Pending,
            GamePhase::Running => PhaseDto::Running,
            GamePhase::Finished => PhaseDto::Finished,
        }
    }
}

/// Snapshot of the global game state pushed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameStateDto {
    /// Current phase.
    pub state: PhaseDto,
    /// Countdown target, epoch ms; present while running or finished.
    pub start_at: Option<u64>,
    /// Frozen question count; present while running or finished.
    pub total_questions: Option<usize>,
}

impl From<&GameState> for GameStateDto {
    fn from(value: &GameState) -> Self {
        Self {
            state: value.phase().into(),
            start_at: value.start_at(),
            total_questions: value.total_questions(),
        }
    }
}
