use std::{sync::Arc, time::SystemTime};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database,
    bson::{Bson, DateTime, doc},
    options::IndexOptions,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult, is_duplicate_key},
    models::{MongoParticipantDocument, MongoQuestionDocument, doc_id, uuid_as_binary},
};
use crate::dao::{
    models::{NewParticipant, NewQuestion, ParticipantEntity, ParticipantResultUpdate, QuestionEntity},
    quiz_store::QuizStore,
    storage::StorageResult,
};

const PARTICIPANT_COLLECTION_NAME: &str = "participants";
const QUESTION_COLLECTION_NAME: &str = "questions";

/// MongoDB-backed [`QuizStore`] implementation.
#[derive(Clone)]
pub struct MongoQuizStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    #[allow(dead_code)]
    client: Client,
    database: Database,
}

impl MongoQuizStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    /// Create the unique indexes backing the contact and ordering constraints.
    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        let participants =
            database.collection::<MongoParticipantDocument>(PARTICIPANT_COLLECTION_NAME);
        let phone_index = mongodb::IndexModel::builder()
            .keys(doc! {"phone": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("participant_phone_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();
        participants
            .create_index(phone_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: PARTICIPANT_COLLECTION_NAME,
                index: "phone",
                source,
            })?;

        let questions = database.collection::<MongoQuestionDocument>(QUESTION_COLLECTION_NAME);
        let order_index = mongodb::IndexModel::builder()
            .keys(doc! {"order_index": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("question_order_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();
        questions
            .create_index(order_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: QUESTION_COLLECTION_NAME,
                index: "order_index",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn participant_collection(&self) -> Collection<MongoParticipantDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoParticipantDocument>(PARTICIPANT_COLLECTION_NAME)
    }

    async fn question_collection(&self) -> Collection<MongoQuestionDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoQuestionDocument>(QUESTION_COLLECTION_NAME)
    }

    async fn ping(&self) -> MongoResult<()> {
        let database = self.database().await;
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) = establish_connection(
            &self.inner.config.options,
            &self.inner.config.database_name,
        )
        .await?;
        let mut guard = self.inner.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }

    async fn create_participant(&self, participant: NewParticipant) -> MongoResult<Uuid> {
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
        let document: MongoParticipantDocument = entity.into();

        let collection = self.participant_collection().await;
        collection.insert_one(&document).await.map_err(|source| {
            if is_duplicate_key(&source) {
                MongoDaoError::DuplicateKey { field: "phone" }
            } else {
                MongoDaoError::Participant {
                    operation: "create",
                    source,
                }
            }
        })?;

        Ok(id)
    }

    async fn participants_by_ids(&self, ids: Vec<Uuid>) -> MongoResult<Vec<ParticipantEntity>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let binaries: Vec<Bson> = ids
            .into_iter()
            .map(|id| Bson::Binary(uuid_as_binary(id)))
            .collect();

        let collection = self.participant_collection().await;
        let documents: Vec<MongoParticipantDocument> = collection
            .find(doc! {"_id": {"$in": binaries}})
            .await
            .map_err(|source| MongoDaoError::Participant {
                operation: "find_by_ids",
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Participant {
                operation: "find_by_ids",
                source,
            })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn list_participants(&self) -> MongoResult<Vec<ParticipantEntity>> {
        let collection = self.participant_collection().await;
        let documents: Vec<MongoParticipantDocument> = collection
            .find(doc! {})
            .sort(doc! {"created_at": -1})
            .await
            .map_err(|source| MongoDaoError::Participant {
                operation: "list",
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Participant {
                operation: "list",
                source,
            })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn delete_all_participants(&self) -> MongoResult<()> {
        let collection = self.participant_collection().await;
        collection
            .delete_many(doc! {})
            .await
            .map_err(|source| MongoDaoError::Participant {
                operation: "delete_all",
                source,
            })?;
        Ok(())
    }

    async fn update_participant_result(&self, update: ParticipantResultUpdate) -> MongoResult<()> {
        let finished_at = update
            .finished_at
            .map(|at| Bson::DateTime(DateTime::from_system_time(at)))
            .unwrap_or(Bson::Null);
        let duration_ms = update
            .duration_ms
            .map(|ms| Bson::Int64(ms as i64))
            .unwrap_or(Bson::Null);

        let collection = self.participant_collection().await;
        collection
            .update_one(
                doc_id(update.participant_id),
                doc! {"$set": {
                    "correct_count": update.correct_count as i64,
                    "wrong_count": update.wrong_count as i64,
                    "finished_at": finished_at,
                    "duration_ms": duration_ms,
                }},
            )
            .await
            .map_err(|source| MongoDaoError::Participant {
                operation: "update_result",
                source,
            })?;

        Ok(())
    }

    async fn list_questions(&self) -> MongoResult<Vec<QuestionEntity>> {
        let collection = self.question_collection().await;
        let documents: Vec<MongoQuestionDocument> = collection
            .find(doc! {})
            .sort(doc! {"order_index": 1})
            .await
            .map_err(|source| MongoDaoError::Question {
                operation: "list",
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Question {
                operation: "list",
                source,
            })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn create_question(&self, question: NewQuestion) -> MongoResult<Uuid> {
        let entity = QuestionEntity {
            id: Uuid::new_v4(),
            text: question.text,
            options: question.options,
            correct: question.correct,
            order_index: question.order_index,
        };
        let id = entity.id;
        let document: MongoQuestionDocument = entity.into();

        let collection = self.question_collection().await;
        collection.insert_one(&document).await.map_err(|source| {
            if is_duplicate_key(&source) {
                MongoDaoError::DuplicateKey {
                    field: "order_index",
                }
            } else {
                MongoDaoError::Question {
                    operation: "create",
                    source,
                }
            }
        })?;

        Ok(id)
    }

    async fn update_question(&self, id: Uuid, question: NewQuestion) -> MongoResult<bool> {
        let collection = self.question_collection().await;
        let result = collection
            .update_one(
                doc_id(id),
                doc! {"$set": {
                    "text": question.text,
                    "options": question.options,
                    "correct": question.correct,
                    "order_index": question.order_index as i64,
                }},
            )
            .await
            .map_err(|source| {
                if is_duplicate_key(&source) {
                    MongoDaoError::DuplicateKey {
                        field: "order_index",
                    }
                } else {
                    MongoDaoError::Question {
                        operation: "update",
                        source,
                    }
                }
            })?;

        Ok(result.matched_count > 0)
    }

    async fn delete_question(&self, id: Uuid) -> MongoResult<bool> {
        let collection = self.question_collection().await;
        let result = collection
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::Question {
                operation: "delete",
                source,
            })?;
        Ok(result.deleted_count > 0)
    }
}

impl QuizStore for MongoQuizStore {
    fn create_participant(
        &self,
        participant: NewParticipant,
    ) -> BoxFuture<'static, StorageResult<Uuid>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .create_participant(participant)
                .await
                .map_err(Into::into)
        })
    }

    fn participants_by_ids(
        &self,
        ids: Vec<Uuid>,
    ) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.participants_by_ids(ids).await.map_err(Into::into) })
    }

    fn list_participants(&self) -> BoxFuture<'static, StorageResult<Vec<ParticipantEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_participants().await.map_err(Into::into) })
    }

    fn delete_all_participants(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.delete_all_participants().await.map_err(Into::into) })
    }

    fn update_participant_result(
        &self,
        update: ParticipantResultUpdate,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update_participant_result(update)
                .await
                .map_err(Into::into)
        })
    }

    fn list_questions(&self) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_questions().await.map_err(Into::into) })
    }

    fn create_question(&self, question: NewQuestion) -> BoxFuture<'static, StorageResult<Uuid>> {
        let store = self.clone();
        Box::pin(async move { store.create_question(question).await.map_err(Into::into) })
    }

    fn update_question(
        &self,
        id: Uuid,
        question: NewQuestion,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.update_question(id, question).await.map_err(Into::into) })
    }

    fn delete_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_question(id).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.reconnect().await.map_err(Into::into) })
    }
}
