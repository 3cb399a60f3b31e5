//! Durable storage for the orchestrator.
//!
//! A single MDBX environment with three typed tables: epoch consensus
//! schedules, per-slot verdicts, and the two verification cursors. Writes are
//! atomic per call and serialised process-wide; the cursors are additionally
//! mirrored in memory while the store is open.

mod chaindb;
pub use chaindb::OrchestratorDb;

mod error;
pub use error::StorageError;

pub mod models;

mod providers;

mod traits;
pub use traits::{
    EpochStorageReader, EpochStorageWriter, OrchestratorStorage, VerdictStorageReader,
    VerdictStorageWriter,
};
