mod connection;
mod error;
mod models;
/// MongoDB-backed [`super::QuizStore`] implementation.
pub mod store;

pub use error::MongoDaoError;
pub use store::MongoQuizStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        match err {
            MongoDaoError::DuplicateKey { field } => StorageError::Duplicate { field },
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}

/// Connection parameters for the MongoDB backend.
#[derive(Clone)]
pub struct MongoConfig {
    /// Parsed client options derived from the connection URI.
    pub options: mongodb::options::ClientOptions,
    /// Name of the database holding the quiz collections.
    pub database_name: String,
}

impl MongoConfig {
    /// Build a configuration from a connection URI and optional database name.
    pub async fn from_uri(uri: &str, db_name: Option<&str>) -> Result<Self, MongoDaoError> {
        let database_name = db_name.unwrap_or("quiz_rush").to_owned();
        let options = mongodb::options::ClientOptions::parse(uri)
            .await
            .map_err(|source| MongoDaoError::InvalidUri {
                uri: uri.to_owned(),
                source,
            })?;

        Ok(Self {
            options,
            database_name,
        })
    }
}
