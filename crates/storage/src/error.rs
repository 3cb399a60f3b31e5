use thiserror::Error;

/// Errors that may occur while interacting with the orchestrator store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Failed to initialize the underlying database environment or schema.
    #[error("database initialization failed: {0}")]
    DatabaseInit(String),

    /// A read or write against the database failed.
    #[error("database operation failed")]
    Database(#[from] reth_db_api::DatabaseError),

    /// An idempotency violation: the key already holds a different payload.
    #[error("store conflict: {0}")]
    Conflict(String),

    /// The requested or written slot is below the verified cursor.
    #[error("invalid slot: {0} is behind the latest verified slot")]
    InvalidSlot(u64),
}
