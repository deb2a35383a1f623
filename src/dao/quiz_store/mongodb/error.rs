use thiserror::Error;

/// Result alias for MongoDB DAO operations.
pub type MongoResult<T> = Result<T, MongoDaoError>;

/// Errors raised by the MongoDB quiz store.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// The connection URI could not be parsed.
    #[error("invalid MongoDB URI `{uri}`")]
    InvalidUri {
        /// Offending URI.
        uri: String,
        /// Driver error.
        #[source]
        source: mongodb::error::Error,
    },
    /// The client could not be constructed from the parsed options.
    #[error("failed to construct MongoDB client")]
    ClientConstruction {
        /// Driver error.
        #[source]
        source: mongodb::error::Error,
    },
    /// The initial connectivity ping never succeeded.
    #[error("initial MongoDB ping failed after {attempts} attempts")]
    InitialPing {
        /// Number of attempts made before giving up.
        attempts: u32,
        /// Driver error from the last attempt.
        #[source]
        source: mongodb::error::Error,
    },
    /// Creating a collection index failed.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Collection the index belongs to.
        collection: &'static str,
        /// Index description.
        index: &'static str,
        /// Driver error.
        #[source]
        source: mongodb::error::Error,
    },
    /// A unique index rejected the write.
    #[error("duplicate key for unique field `{field}`")]
    DuplicateKey {
        /// Field covered by the violated unique index.
        field: &'static str,
    },
    /// A participant operation failed.
    #[error("participant operation `{operation}` failed")]
    Participant {
        /// Short name of the failed operation.
        operation: &'static str,
        /// Driver error.
        #[source]
        source: mongodb::error::Error,
    },
    /// A question operation failed.
    #[error("question operation `{operation}` failed")]
    Question {
        /// Short name of the failed operation.
        operation: &'static str,
        /// Driver error.
        #[source]
        source: mongodb::error::Error,
    },
    /// The health ping failed.
    #[error("MongoDB health ping failed")]
    HealthPing {
        /// Driver error.
        #[source]
        source: mongodb::error::Error,
    },
}

/// Whether a driver error is a unique-index (E11000) violation.
pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};

    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == 11000,
        ErrorKind::InsertMany(failure) => failure
            .write_errors
            .as_ref()
            .is_some_and(|errors| errors.iter().any(|e| e.code == 11000)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::is_duplicate_key;

    #[test]
    fn non_write_errors_are_not_duplicates() {
        let err = mongodb::error::Error::custom("connection reset");
        assert!(!is_duplicate_key(&err));
    }
}
