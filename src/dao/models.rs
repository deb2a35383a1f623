use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// Durable participant record persisted by the storage layer.
///
/// Identity fields are written once at registration; the result fields are
/// only committed by the end-of-game persistence step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParticipantEntity {
    /// Primary key of the participant.
    pub id: Uuid,
    /// Given name captured on the registration form.
    pub first_name: String,
    /// Family name captured on the registration form.
    pub last_name: String,
    /// Display name shown on leaderboards.
    pub nick_name: String,
    /// Contact number; unique across all participants.
    pub phone: String,
    /// Registration timestamp.
    pub created_at: SystemTime,
    /// Number of correct answers committed at game end.
    pub correct_count: Option<u32>,
    /// Number of wrong answers committed at game end.
    pub wrong_count: Option<u32>,
    /// Completion timestamp committed at game end.
    pub finished_at: Option<SystemTime>,
    /// Completion duration in milliseconds committed at game end.
    pub duration_ms: Option<u64>,
}

/// Identity fields required to create a participant record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewParticipant {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Display name.
    pub nick_name: String,
    /// Contact number; must be unique.
    pub phone: String,
}

/// Live result fields copied into a durable participant record at game end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantResultUpdate {
    /// Participant the results belong to.
    pub participant_id: Uuid,
    /// Final correct-answer tally.
    pub correct_count: u32,
    /// Final wrong-answer tally.
    pub wrong_count: u32,
    /// Completion timestamp, when the participant finished.
    pub finished_at: Option<SystemTime>,
    /// Completion duration in milliseconds.
    pub duration_ms: Option<u64>,
}

/// Question record persisted in the durable question bank.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionEntity {
    /// Primary key of the question.
    pub id: Uuid,
    /// Question text shown to participants.
    pub text: String,
    /// Ordered answer options.
    pub options: Vec<String>,
    /// The correct option; must be one of `options`.
    pub correct: String,
    /// Explicit position in the question sequence; unique, 1-based.
    pub order_index: u32,
}

/// Fields required to create or replace a question in the bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestion {
    /// Question text.
    pub text: String,
    /// Ordered answer options.
    pub options: Vec<String>,
    /// The correct option.
    pub correct: String,
    /// Explicit position in the question sequence.
    pub order_index: u32,
}
