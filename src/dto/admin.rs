//! DTO definitions used by the admin REST API and documentation layer.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dao::models::{ParticipantEntity, QuestionEntity},
    dto::{format_duration, format_system_time, game::GameStateDto},
    state::registry::ParticipantProgress,
};

/// Generic action acknowledgement used by admin endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    pub message: String,
}

/// Response emitted when a round starts.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartGameResponse {
    pub state: GameStateDto,
    pub participant_count: usize,
}

/// One leaderboard entry: a perfect-run finisher ranked by completion time.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntry {
    pub rank: usize,
    pub participant_id: Uuid,
    pub nick_name: String,
    pub first_name: String,
    pub last_name: String,
    pub correct_count: u32,
    pub duration_ms: u64,
    /// Human-readable `m:ss.cc` rendering of the duration.
    pub duration_text: String,
}

impl RankedEntry {
    /// Join a live progress record with its durable identity record.
    pub fn from_progress(rank: usize, progress: &ParticipantProgress, entity: &ParticipantEntity) -> Self {
        let duration_ms = progress.duration_ms.unwrap_or_default();
        Self {
            rank,
            participant_id: progress.participant_id,
            nick_name: entity.nick_name.clone(),
            first_name: entity.first_name.clone(),
            last_name: entity.last_name.clone(),
            correct_count: progress.correct_count,
            duration_ms,
            duration_text: format_duration(duration_ms),
        }
    }
}

/// Leaderboard of the fastest perfect runs.
#[derive(Debug, Serialize, ToSchema)]
pub struct TopRankedResponse {
    pub top: Vec<RankedEntry>,
}

/// Response returned when a round is ended, gathering the final leaderboard.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EndGameResponse {
    pub state: GameStateDto,
    /// Number of participant records whose results were persisted.
    pub persisted: usize,
    pub top: Vec<RankedEntry>,
}

/// Payload to create or replace a question in the bank.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
    pub text: String,
    pub options: Vec<String>,
    pub correct: String,
    /// 1-based position in the question sequence; unique per question.
    pub order_index: u32,
}

impl Validate for QuestionInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.text.trim().is_empty() {
            let mut err = ValidationError::new("text_empty");
            err.message = Some("Question text must not be empty".into());
            errors.add("text", err);
        }

        if self.options.len() < 2 {
            let mut err = ValidationError::new("too_few_options");
            err.message = Some("A question needs at least two options".into());
            errors.add("options", err);
        }

        if !self.options.iter().any(|option| option == &self.correct) {
            let mut err = ValidationError::new("correct_not_an_option");
            err.message = Some("The correct answer must be one of the options".into());
            errors.add("correct", err);
        }

        if self.order_index == 0 {
            let mut err = ValidationError::new("order_index_zero");
            err.message = Some("Order index is 1-based and must be at least 1".into());
            errors.add("orderIndex", err);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Full projection of a question for administrators, correct answer included.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResponse {
    pub id: Uuid,
    pub text: String,
    pub options: Vec<String>,
    pub correct: String,
    pub order_index: u32,
}

impl From<QuestionEntity> for QuestionResponse {
    fn from(value: QuestionEntity) -> Self {
        Self {
            id: value.id,
            text: value.text,
            options: value.options,
            correct: value.correct,
            order_index: value.order_index,
        }
    }
}

/// Projection of a durable participant record when listed for administrators.
#[serde_with::skip_serializing_none]
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantListItem {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub nick_name: String,
    pub phone: String,
    pub created_at: String,
    pub correct_count: Option<u32>,
    pub wrong_count: Option<u32>,
    pub finished_at: Option<String>,
    pub duration_ms: Option<u64>,
}

impl From<ParticipantEntity> for ParticipantListItem {
    fn from(value: ParticipantEntity) -> Self {
        Self {
            id: value.id,
            first_name: value.first_name,
            last_name: value.last_name,
            nick_name: value.nick_name,
            phone: value.phone,
            created_at: format_system_time(value.created_at),
            correct_count: value.correct_count,
            wrong_count: value.wrong_count,
            finished_at: value.finished_at.map(format_system_time),
            duration_ms: value.duration_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> QuestionInput {
        QuestionInput {
            text: "Capital of France?".into(),
            options: vec!["Paris".into(), "Lyon".into()],
            correct: "Paris".into(),
            order_index: 1,
        }
    }

    #[test]
    fn valid_question_passes() {
        assert!(input().validate().is_ok());
    }

    #[test]
    fn correct_answer_must_be_listed() {
        let mut question = input();
        question.correct = "Marseille".into();
        let errors = question.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("correct"));
    }

    #[test]
    fn rejects_blank_text_and_short_option_lists() {
        let mut question = input();
        question.text = "  ".into();
        question.options = vec!["Paris".into()];
        let errors = question.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("text"));
        assert!(errors.field_errors().contains_key("options"));
    }

    #[test]
    fn order_index_is_one_based() {
        let mut question = input();
        question.order_index = 0;
        assert!(question.validate().is_err());
    }
}
