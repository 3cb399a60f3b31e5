use orchestrator_storage::StorageError;
use thiserror::Error;

/// Errors raised by the upstream chain subscribers.
///
/// All of these are recovered locally by the subscriber's reconnect loop;
/// they surface to the operator only through the `status()` probe and the
/// logs.
#[derive(Debug, Error)]
pub enum SubscriberError {
    /// Dialing or talking to the upstream node failed.
    #[error(transparent)]
    Client(#[from] jsonrpsee::core::ClientError),

    /// A notification payload could not be deserialized.
    #[error("notification decode failed: {0}")]
    Decode(#[from] serde_json::Error),

    /// The notification stream ended without an error.
    #[error("subscription stream closed by server")]
    StreamClosed,

    /// The durable store rejected a write.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors raised while evaluating a slot match.
#[derive(Debug, Error)]
pub enum VerifierError {
    /// The durable store failed; the cache entries are kept for a retry.
    #[error(transparent)]
    Storage(#[from] StorageError),
}
