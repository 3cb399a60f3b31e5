use std::io;

use async_trait::async_trait;
use orchestrator_rpc::OrchestratorRpcServer;
use orchestrator_storage::{EpochStorageReader, VerdictStorageReader};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::OrchestratorActor;

/// Runs the downstream notification RPC server.
#[derive(Debug)]
pub struct RpcActor<DB> {
    server: OrchestratorRpcServer<DB>,
    cancel_token: CancellationToken,
}

impl<DB> RpcActor<DB> {
    /// Creates a new actor around the server.
    pub const fn new(server: OrchestratorRpcServer<DB>, cancel_token: CancellationToken) -> Self {
        Self { server, cancel_token }
    }
}

#[async_trait]
impl<DB> OrchestratorActor for RpcActor<DB>
where
    DB: EpochStorageReader + VerdictStorageReader + std::fmt::Debug + 'static,
{
    type Error = io::Error;

    async fn start(self) -> Result<(), Self::Error> {
        info!(
            target: "orchestrator::rpc",
            addr = %self.server.socket(),
            "Starting orchestrator RPC actor"
        );

        let (handle, _addr) = self.server.launch().await?;

        // Dropping the handle on cancellation shuts the server down.
        tokio::select! {
            _ = self.cancel_token.cancelled() => {
                info!(target: "orchestrator::rpc", "Cancellation requested, stopping RPC server...");
            }
            _ = handle.clone().stopped() => {
                info!(target: "orchestrator::rpc", "Orchestrator RPC server stopped gracefully");
            }
        }

        Ok(())
    }
}
