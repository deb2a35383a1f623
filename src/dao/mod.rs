/// Database model definitions.
pub mod models;
/// Durable quiz storage operations and backends.
pub mod quiz_store;
/// Storage abstraction layer for database operations.
pub mod storage;
