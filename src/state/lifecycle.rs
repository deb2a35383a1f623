use thiserror::Error;

/// High-level phases the game can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Nothing has happened yet; the question bank can be managed freely.
    Idle,
    /// At least one participant registered; waiting for the admin start command.
    Pending,
    /// A round is in progress against a frozen question snapshot.
    Running,
    /// The round has been closed; results are final.
    Finished,
}

/// Events that can be applied to the lifecycle controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// A participant registered; promotes Idle to Pending, no-op while Pending.
    FirstRegistration,
    /// Admin start command with the computed round parameters.
    Start {
        /// Epoch milliseconds when the first question becomes servable.
        start_at: u64,
        /// Length of the captured question snapshot.
        total_questions: usize,
        /// Operator identity, audit only.
        started_by: String,
    },
    /// Admin end command freezing the round.
    End {
        /// Operator identity, audit only.
        ended_by: String,
    },
    /// Admin escape hatch returning everything to Idle.
    Reset,
}

impl GameEvent {
    fn name(&self) -> &'static str {
        match self {
            GameEvent::FirstRegistration => "first_registration",
            GameEvent::Start { .. } => "start",
            GameEvent::End { .. } => "end",
            GameEvent::Reset => "reset",
        }
    }
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: `{event}` cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the controller was in when the invalid event was received.
    pub from: GamePhase,
    /// Name of the event that cannot be applied from this phase.
    pub event: &'static str,
}

/// Single source of truth for the global game lifecycle.
///
/// All transition effects are applied inside [`GameState::apply`] while the
/// caller holds the state write lock, so readers never observe a
/// partially-updated state such as Running with no `start_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    phase: GamePhase,
    start_at: Option<u64>,
    total_questions: Option<usize>,
    started_by: Option<String>,
    ended_by: Option<String>,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            phase: GamePhase::Idle,
            start_at: None,
            total_questions: None,
            started_by: None,
            ended_by: None,
        }
    }
}

impl GameState {
    /// Create a lifecycle controller initialised in the idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Epoch milliseconds when the countdown ends; `Some` iff Running or Finished.
    pub fn start_at(&self) -> Option<u64> {
        self.start_at
    }

    /// Snapshot length frozen at Running-entry; `Some` iff Running or Finished.
    pub fn total_questions(&self) -> Option<usize> {
        self.total_questions
    }

    /// Validate and apply an event in one step, returning the new phase.
    ///
    /// Guards follow the strictly linear flow idle → pending → running →
    /// finished, with `Reset` as the only escape hatch back to idle.
    pub fn apply(&mut self, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
        match (self.phase, event) {
            (GamePhase::Idle, GameEvent::FirstRegistration) => {
                self.phase = GamePhase::Pending;
            }
            // Later registrations while pending are an expected no-op.
            (GamePhase::Pending, GameEvent::FirstRegistration) => {}
            (
                GamePhase::Pending,
                GameEvent::Start {
                    start_at,
                    total_questions,
                    started_by,
                },
            ) => {
                self.phase = GamePhase::Running;
                self.start_at = Some(start_at);
                self.total_questions = Some(total_questions);
                self.started_by = Some(started_by);
            }
            (GamePhase::Running, GameEvent::End { ended_by }) => {
                // Finished retains start_at/total_questions for reporting.
                self.phase = GamePhase::Finished;
                self.ended_by = Some(ended_by);
            }
            (_, GameEvent::Reset) => {
                *self = Self::default();
            }
            (from, event) => {
                return Err(InvalidTransition {
                    from,
                    event: event.name(),
                });
            }
        }

        Ok(self.phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start_event() -> GameEvent {
        GameEvent::Start {
            start_at: 1_000,
            total_questions: 5,
            started_by: "admin".into(),
        }
    }

    #[test]
    fn initial_state_is_idle() {
        let state = GameState::new();
        assert_eq!(state.phase(), GamePhase::Idle);
        assert_eq!(state.start_at(), None);
        assert_eq!(state.total_questions(), None);
    }

    #[test]
    fn first_registration_promotes_idle_to_pending() {
        let mut state = GameState::new();
        assert_eq!(
            state.apply(GameEvent::FirstRegistration),
            Ok(GamePhase::Pending)
        );
        // Subsequent registrations are a no-op, not an error.
        assert_eq!(
            state.apply(GameEvent::FirstRegistration),
            Ok(GamePhase::Pending)
        );
    }

    #[test]
    fn start_requires_pending() {
        let mut state = GameState::new();
        let err = state.apply(start_event()).unwrap_err();
        assert_eq!(err.from, GamePhase::Idle);
        assert_eq!(err.event, "start");
        assert_eq!(state.phase(), GamePhase::Idle);
    }

    #[test]
    fn start_sets_round_fields_atomically() {
        let mut state = GameState::new();
        state.apply(GameEvent::FirstRegistration).unwrap();
        assert_eq!(state.apply(start_event()), Ok(GamePhase::Running));
        assert_eq!(state.start_at(), Some(1_000));
        assert_eq!(state.total_questions(), Some(5));
    }

    #[test]
    fn end_requires_running_and_retains_round_fields() {
        let mut state = GameState::new();
        let err = state
            .apply(GameEvent::End {
                ended_by: "admin".into(),
            })
            .unwrap_err();
        assert_eq!(err.from, GamePhase::Idle);

        state.apply(GameEvent::FirstRegistration).unwrap();
        state.apply(start_event()).unwrap();
        assert_eq!(
            state.apply(GameEvent::End {
                ended_by: "admin".into(),
            }),
            Ok(GamePhase::Finished)
        );
        assert_eq!(state.start_at(), Some(1_000));
        assert_eq!(state.total_questions(), Some(5));
    }

    #[test]
    fn registration_is_rejected_once_running_or_finished() {
        let mut state = GameState::new();
        state.apply(GameEvent::FirstRegistration).unwrap();
        state.apply(start_event()).unwrap();
        assert!(state.apply(GameEvent::FirstRegistration).is_err());

        state
            .apply(GameEvent::End {
                ended_by: "admin".into(),
            })
            .unwrap();
        assert!(state.apply(GameEvent::FirstRegistration).is_err());
    }

    #[test]
    fn reset_returns_to_idle_from_any_phase() {
        let mut state = GameState::new();
        assert_eq!(state.apply(GameEvent::Reset), Ok(GamePhase::Idle));

        state.apply(GameEvent::FirstRegistration).unwrap();
        state.apply(start_event()).unwrap();
        assert_eq!(state.apply(GameEvent::Reset), Ok(GamePhase::Idle));
        assert_eq!(state.start_at(), None);
        assert_eq!(state.total_questions(), None);
    }
}
