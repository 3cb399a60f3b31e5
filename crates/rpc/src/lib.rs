//! Downstream notification RPC for the orchestrator.
//!
//! External clients subscribe here for the consensus schedule
//! (historical-then-live) and batch-confirm block hashes against the
//! persisted slot verdicts.

mod api;
pub use api::{OrchestratorApiClient, OrchestratorApiServer};

mod response;
pub use response::{BlockHash, BlockStatus};

mod server;
pub use server::OrchestratorRpcServer;
