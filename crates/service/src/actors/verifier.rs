use std::{convert::Infallible, sync::Arc};

use async_trait::async_trait;
use orchestrator_core::{OrchestratorFeeds, SignatureVerifier, Verifier};
use orchestrator_storage::{EpochStorageReader, VerdictStorageReader, VerdictStorageWriter};
use orchestrator_types::{EpochInfo, PendingHeader, ShardInfo};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::OrchestratorActor;

/// Feeds pending headers, shard infos and epoch schedules into the
/// [`Verifier`], one event at a time in receive order.
#[derive(Debug)]
pub struct VerifierActor<DB, S> {
    verifier: Arc<Verifier<DB, S>>,
    cancel_token: CancellationToken,
    pan_rx: broadcast::Receiver<PendingHeader>,
    van_rx: broadcast::Receiver<ShardInfo>,
    info_rx: broadcast::Receiver<EpochInfo>,
}

impl<DB, S> VerifierActor<DB, S>
where
    DB: EpochStorageReader + VerdictStorageReader + VerdictStorageWriter + 'static,
    S: SignatureVerifier,
{
    /// Creates a new actor, subscribing to the three inbound feeds.
    pub fn new(
        verifier: Arc<Verifier<DB, S>>,
        feeds: &OrchestratorFeeds,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            verifier,
            cancel_token,
            pan_rx: feeds.pending_pan_header.subscribe(),
            van_rx: feeds.pending_van_shard.subscribe(),
            info_rx: feeds.consensus_info.subscribe(),
        }
    }
}

#[async_trait]
impl<DB, S> OrchestratorActor for VerifierActor<DB, S>
where
    DB: EpochStorageReader + VerdictStorageReader + VerdictStorageWriter + std::fmt::Debug + 'static,
    S: SignatureVerifier + 'static,
{
    type Error = Infallible;

    async fn start(mut self) -> Result<(), Self::Error> {
        info!(target: "orchestrator::verifier", "Starting verifier actor");

        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    info!(
                        target: "orchestrator::verifier",
                        "Verifier actor cancellation requested, stopping..."
                    );
                    return Ok(());
                }
                maybe_header = self.pan_rx.recv() => match maybe_header {
                    Ok(header) => self.verifier.on_pan_header(&header).await,
                    Err(RecvError::Lagged(missed)) => {
                        warn!(
                            target: "orchestrator::verifier",
                            missed,
                            "Verifier lagged on pending header feed"
                        );
                    }
                    Err(RecvError::Closed) => return Ok(()),
                },
                maybe_shard = self.van_rx.recv() => match maybe_shard {
                    Ok(shard) => self.verifier.on_van_shard(&shard).await,
                    Err(RecvError::Lagged(missed)) => {
                        warn!(
                            target: "orchestrator::verifier",
                            missed,
                            "Verifier lagged on shard info feed"
                        );
                    }
                    Err(RecvError::Closed) => return Ok(()),
                },
                maybe_info = self.info_rx.recv() => match maybe_info {
                    Ok(info) => self.verifier.on_consensus_info(&info).await,
                    Err(RecvError::Lagged(missed)) => {
                        warn!(
                            target: "orchestrator::verifier",
                            missed,
                            "Verifier lagged on consensus info feed"
                        );
                    }
                    Err(RecvError::Closed) => return Ok(()),
                },
            }
        }
    }
}
