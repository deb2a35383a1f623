/// MongoDB backend for the quiz store.
pub mod mongodb;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{NewParticipant, NewQuestion, ParticipantEntity, ParticipantResultUpdate, QuestionEntity};
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer for participants and the question bank.
pub trait QuizStore: Send + Sync {
    /// Insert a participant record, enforcing the unique phone constraint.
    fn create_participant(
        &self,
        participant: NewParticipant,
    ) -> BoxFuture<'static, StorageResult<Uuid>>;
    /// Fetch the participant records matching the given ids.
    fn participants_by_ids(
        &self,
        ids: Vec<Uuid>,
    ) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>>;
    /// List every participant record, newest registration first.
    fn list_participants(&self) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>>;
    /// Delete every participant record.
    fn delete_all_participants(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Commit live results into a durable participant record.
    fn update_participant_result(
        &self,
        update: ParticipantResultUpdate,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// List the question bank ordered by `order_index` ascending.
    fn list_questions(&self) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>>;
    /// Insert a question, enforcing the unique order-index constraint.
    fn create_question(&self, question: NewQuestion) -> BoxFuture<'static, StorageResult<Uuid>>;
    /// Replace a question's fields; returns false when the id is unknown.
    fn update_question(
        &self,
        id: Uuid,
        question: NewQuestion,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Delete a question; returns false when the id is unknown.
    fn delete_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    /// Cheap connectivity probe used by the health service and supervisor.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
