//! Shared test doubles for service-layer tests.

use std::{
    sync::{Arc, Mutex},
    time::SystemTime,
};

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    models::{
        NewParticipant, NewQuestion, ParticipantEntity, ParticipantResultUpdate, QuestionEntity,
    },
    quiz_store::QuizStore,
    storage::{StorageError, StorageResult},
};

/// In-memory stand-in for the MongoDB store.
#[derive(Default)]
pub(crate) struct MemoryStore {
    participants: Arc<Mutex<Vec<ParticipantEntity>>>,
    questions: Arc<Mutex<Vec<QuestionEntity>>>,
}

impl QuizStore for MemoryStore {
    fn create_participant(
        &self,
        participant: NewParticipant,
    ) -> BoxFuture<'static, StorageResult<Uuid>> {
        let participants = self.participants.clone();
        Box::pin(async move {
            let mut guard = participants.lock().unwrap();
            if guard.iter().any(|p| p.phone == participant.phone) {
                return Err(StorageError::Duplicate { field: "phone" });
            }
            let entity = ParticipantEntity {
                id: Uuid::new_v4(),
                first_name: participant.first_name,
                last_name: participant.last_name,
                nick_name: participant.nick_name,
                phone: participant.phone,
                created_at: SystemTime::now(),
                correct_count: None,
                wrong_count: None,
                finished_at: None,
                duration_ms: None,
            };
            let id = entity.id;
            guard.push(entity);
            Ok(id)
        })
    }

    fn participants_by_ids(
        &self,
        ids: Vec<Uuid>,
    ) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>> {
        let participants = self.participants.clone();
        Box::pin(async move {
            let guard = participants.lock().unwrap();
            Ok(guard
                .iter()
                .filter(|p| ids.contains(&p.id))
                .cloned()
                .collect())
        })
    }

    fn list_participants(&self) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>> {
        let participants = self.participants.clone();
        Box::pin(async move { Ok(participants.lock().unwrap().clone()) })
    }

    fn delete_all_participants(&self) -> BoxFuture<'static, StorageResult<()>> {
        let participants = self.participants.clone();
        Box::pin(async move {
            participants.lock().unwrap().clear();
            Ok(())
        })
    }

    fn update_participant_result(
        &self,
        update: ParticipantResultUpdate,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let participants = self.participants.clone();
        Box::pin(async move {
            let mut guard = participants.lock().unwrap();
            if let Some(entity) = guard.iter_mut().find(|p| p.id == update.participant_id) {
                entity.correct_count = Some(update.correct_count);
                entity.wrong_count = Some(update.wrong_count);
                entity.finished_at = update.finished_at;
                entity.duration_ms = update.duration_ms;
            }
            Ok(())
        })
    }

    fn list_questions(&self) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let questions = self.questions.clone();
        Box::pin(async move {
            let mut listing = questions.lock().unwrap().clone();
            listing.sort_by_key(|q| q.order_index);
            Ok(listing)
        })
    }

    fn create_question(
        &self,
        question: NewQuestion,
    ) -> BoxFuture<'static, StorageResult<Uuid>> {
        let questions = self.questions.clone();
        Box::pin(async move {
            let mut guard = questions.lock().unwrap();
            if guard.iter().any(|q| q.order_index == question.order_index) {
                return Err(StorageError::Duplicate {
                    field: "order_index",
                });
            }
            let entity = QuestionEntity {
                id: Uuid::new_v4(),
                text: question.text,
                options: question.options,
                correct: question.correct,
                order_index: question.order_index,
            };
            let id = entity.id;
            guard.push(entity);
            Ok(id)
        })
    }

    fn update_question(
        &self,
        id: Uuid,
        question: NewQuestion,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let questions = self.questions.clone();
        Box::pin(async move {
            let mut guard = questions.lock().unwrap();
            match guard.iter_mut().find(|q| q.id == id) {
                Some(entity) => {
                    entity.text = question.text;
                    entity.options = question.options;
                    entity.correct = question.correct;
                    entity.order_index = question.order_index;
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    fn delete_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let questions = self.questions.clone();
        Box::pin(async move {
            let mut guard = questions.lock().unwrap();
            let before = guard.len();
            guard.retain(|q| q.id != id);
            Ok(guard.len() < before)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
