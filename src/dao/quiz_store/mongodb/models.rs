use mongodb::bson::{Binary, DateTime, Document, doc, spec::BinarySubtype};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{ParticipantEntity, QuestionEntity};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoParticipantDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    first_name: String,
    last_name: String,
    nick_name: String,
    phone: String,
    created_at: DateTime,
    #[serde(default)]
    correct_count: Option<u32>,
    #[serde(default)]
    wrong_count: Option<u32>,
    #[serde(default)]
    finished_at: Option<DateTime>,
    #[serde(default)]
    duration_ms: Option<u64>,
}

impl From<ParticipantEntity> for MongoParticipantDocument {
    fn from(value: ParticipantEntity) -> Self {
        Self {
            id: value.id,
            first_name: value.first_name,
            last_name: value.last_name,
            nick_name: value.nick_name,
            phone: value.phone,
            created_at: DateTime::from_system_time(value.created_at),
            correct_count: value.correct_count,
            wrong_count: value.wrong_count,
            finished_at: value.finished_at.map(DateTime::from_system_time),
            duration_ms: value.duration_ms,
        }
    }
}

impl From<MongoParticipantDocument> for ParticipantEntity {
    fn from(value: MongoParticipantDocument) -> Self {
        Self {
            id: value.id,
            first_name: value.first_name,
            last_name: value.last_name,
            nick_name: value.nick_name,
            phone: value.phone,
            created_at: value.created_at.to_system_time(),
            correct_count: value.correct_count,
            wrong_count: value.wrong_count,
            finished_at: value.finished_at.map(|dt| dt.to_system_time()),
            duration_ms: value.duration_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoQuestionDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    text: String,
    options: Vec<String>,
    correct: String,
    order_index: u32,
}

impl From<QuestionEntity> for MongoQuestionDocument {
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

impl From<MongoQuestionDocument> for QuestionEntity {
    fn from(value: MongoQuestionDocument) -> Self {
        Self {
            id: value.id,
            text: value.text,
            options: value.options,
            correct: value.correct,
            order_index: value.order_index,
        }
    }
}

pub fn uuid_as_binary(id: Uuid) -> Binary {
    Binary {
        subtype: BinarySubtype::Uuid,
        bytes: id.into_bytes().to_vec(),
    }
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": uuid_as_binary(id)}
}
