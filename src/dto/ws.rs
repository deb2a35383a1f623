use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::game::GameStateDto,
    state::{registry::AnswerRecord, snapshot::SnapshotQuestion},
};

/// Messages accepted from participant WebSocket clients.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Answer submission for the question at the participant's cursor.
    #[serde(rename = "answer")]
    Answer {
        /// The chosen option, compared verbatim against the correct one.
        answer: String,
    },
    /// Legacy explicit completion request; superseded by auto-finish on the
    /// last answer but still accepted for compatibility.
    #[serde(rename = "finish")]
    Finish,
    /// Request to re-derive and re-emit current state (after reconnects or
    /// phase-change broadcasts).
    #[serde(rename = "player:sync")]
    Sync,
    /// Any unrecognized message type; ignored.
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    /// Parse a raw text frame into a client message.
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Question projection sent to participants; never carries the correct option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PublicQuestion {
    /// Durable question id.
    pub id: Uuid,
    /// Question text.
    pub text: String,
    /// Ordered answer options.
    pub options: Vec<String>,
}

impl From<&SnapshotQuestion> for PublicQuestion {
    fn from(value: &SnapshotQuestion) -> Self {
        Self {
            id: value.id,
            text: value.text.clone(),
            options: value.options.clone(),
        }
    }
}

/// Messages pushed to participant WebSocket clients.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Snapshot of the global game state.
    #[serde(rename = "game:state")]
    GameState(GameStateDto),
    /// The question at the participant's current cursor.
    #[serde(rename = "question:current")]
    QuestionCurrent {
        /// 0-based cursor position.
        index: usize,
        /// Public projection of the question.
        question: PublicQuestion,
    },
    /// Acknowledgement with updated counters after an accepted answer.
    #[serde(rename = "answer:ack")]
    #[serde(rename_all = "camelCase")]
    AnswerAck {
        /// Verdict for the submitted answer.
        correct: bool,
        /// Correct answers so far.
        correct_count: u32,
        /// Wrong answers so far.
        wrong_count: u32,
        /// Whether the participant finished with this answer.
        done: bool,
    },
    /// Final counters, duration and answer log for a finished participant.
    #[serde(rename = "player:done")]
    #[serde(rename_all = "camelCase")]
    PlayerDone {
        /// Final correct-answer tally.
        correct_count: u32,
        /// Final wrong-answer tally.
        wrong_count: u32,
        /// Completion duration in milliseconds.
        duration_ms: u64,
        /// Full per-question answer log.
        answers: Vec<AnswerRecord>,
    },
    /// Response to the legacy explicit finish request.
    #[serde(rename = "finish:ack")]
    #[serde(rename_all = "camelCase")]
    FinishAck {
        /// Whether the participant is done.
        done: bool,
        /// Completion duration, present when `done`.
        #[serde(skip_serializing_if = "Option::is_none")]
        duration_ms: Option<u64>,
        /// Full answer log, present when `done`.
        #[serde(skip_serializing_if = "Option::is_none")]
        answers: Option<Vec<AnswerRecord>>,
        /// Rejection reason, present when not `done`.
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// Sent on full reset; the client must forget its session token.
    #[serde(rename = "session:invalidated")]
    SessionInvalidated,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::game::PhaseDto;

    #[test]
    fn client_messages_parse_by_tag() {
        let msg = ClientMessage::from_json_str(r#"{"type":"answer","answer":"42"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Answer { answer } if answer == "42"));

        let msg = ClientMessage::from_json_str(r#"{"type":"player:sync"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Sync));

        let msg = ClientMessage::from_json_str(r#"{"type":"mystery"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Unknown));
    }

    #[test]
    fn server_messages_carry_wire_tags() {
        let message = ServerMessage::GameState(GameStateDto {
            state: PhaseDto::Running,
            start_at: Some(1_234),
            total_questions: Some(10),
        });
        let value: serde_json::Value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["type"], "game:state");
        assert_eq!(value["state"], "RUNNING");
        assert_eq!(value["startAt"], 1_234);
        assert_eq!(value["totalQuestions"], 10);

        let message = ServerMessage::AnswerAck {
            correct: true,
            correct_count: 3,
            wrong_count: 1,
            done: false,
        };
        let value: serde_json::Value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["type"], "answer:ack");
        assert_eq!(value["correctCount"], 3);
    }
}
