//! RPC server implementation backed by the durable store and the live
//! consensus-info feed.

use crate::{
    api::OrchestratorApiServer,
    response::{BlockHash, BlockStatus},
};
use async_trait::async_trait;
use jsonrpsee::{
    core::{RpcResult, SubscriptionResult},
    server::{PendingSubscriptionSink, ServerBuilder, ServerHandle, SubscriptionMessage},
    types::{ErrorCode, ErrorObject, ErrorObjectOwned},
};
use orchestrator_core::Feed;
use orchestrator_storage::{EpochStorageReader, VerdictStorageReader};
use orchestrator_types::{EpochInfo, VerdictStatus};
use std::{net::SocketAddr, sync::Arc};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

const NOTIFICATION_METHOD: &str = "orc_minimalConsensusInfo";

/// Serves the orchestrator's notification API.
#[derive(Debug)]
pub struct OrchestratorRpcServer<DB> {
    db: Arc<DB>,
    consensus_info_feed: Feed<EpochInfo>,
    socket: SocketAddr,
}

impl<DB> OrchestratorRpcServer<DB>
where
    DB: EpochStorageReader + VerdictStorageReader + std::fmt::Debug + 'static,
{
    /// Creates a new server; nothing is bound until [`Self::launch`].
    pub fn new(db: Arc<DB>, consensus_info_feed: Feed<EpochInfo>, socket: SocketAddr) -> Self {
        Self { db, consensus_info_feed, socket }
    }

    /// The configured listen address.
    pub const fn socket(&self) -> SocketAddr {
        self.socket
    }

    /// Binds the listener and starts serving. Returns the handle together
    /// with the actually bound address (relevant with port 0).
    pub async fn launch(self) -> std::io::Result<(ServerHandle, SocketAddr)> {
        let server = ServerBuilder::default().build(self.socket).await?;
        let addr = server.local_addr()?;
        info!(target: "orchestrator::rpc", %addr, "Orchestrator RPC server listening");
        Ok((server.start(self.into_rpc()), addr))
    }

    fn confirm_block_hashes(
        &self,
        api: &'static str,
        requests: Vec<BlockHash>,
    ) -> RpcResult<Vec<BlockStatus>> {
        if requests.is_empty() {
            return Err(invalid_request("request has empty slice"));
        }

        let mut statuses = Vec::with_capacity(requests.len());
        for request in requests {
            let status = match self.db.slot_verdict(request.slot) {
                Ok(Some(verdict)) if verdict.header_hash == request.hash => verdict.status,
                Ok(Some(_)) => VerdictStatus::Invalid,
                Ok(None) => VerdictStatus::Pending,
                Err(err) => {
                    warn!(target: "orchestrator::rpc", slot = request.slot, %err, api, "Verdict lookup failed");
                    return Err(ErrorObject::from(ErrorCode::InternalError));
                }
            };
            debug!(
                target: "orchestrator::rpc",
                slot = request.slot,
                %status,
                api,
                "Status of the requested slot"
            );
            statuses.push(BlockStatus { block_hash: request, status });
        }
        Ok(statuses)
    }
}

fn invalid_request(message: &str) -> ErrorObjectOwned {
    ErrorObject::owned(ErrorCode::InvalidParams.code(), message.to_string(), None::<()>)
}

#[async_trait]
impl<DB> OrchestratorApiServer for OrchestratorRpcServer<DB>
where
    DB: EpochStorageReader + VerdictStorageReader + std::fmt::Debug + 'static,
{
    async fn minimal_consensus_info(
        &self,
        pending: PendingSubscriptionSink,
        from_epoch: u64,
    ) -> SubscriptionResult {
        info!(
            target: "orchestrator::rpc",
            from_epoch,
            "Received stream connection for minimal consensus info"
        );

        // Subscribe to the live feed before snapshotting the store so no
        // schedule falls between replay and live streaming.
        let mut live = self.consensus_info_feed.subscribe();
        let db = self.db.clone();

        tokio::spawn(async move {
            let sink = match pending.accept().await {
                Ok(sink) => sink,
                Err(err) => {
                    warn!(target: "orchestrator::rpc", %err, "Failed to accept subscription");
                    return;
                }
            };
            let id = sink.subscription_id();

            let known = match db.epoch_range(from_epoch) {
                Ok(known) => known,
                Err(err) => {
                    warn!(target: "orchestrator::rpc", from_epoch, %err, "Epoch replay failed");
                    return;
                }
            };
            if known.is_empty() {
                info!(target: "orchestrator::rpc", from_epoch, "No already-known epochs to replay");
            }

            // Everything below `next_epoch` has been delivered; filters the
            // replay/live overlap.
            let mut next_epoch = from_epoch;
            for info in known {
                debug!(
                    target: "orchestrator::rpc",
                    epoch = info.epoch,
                    epoch_start_time = info.epoch_start_time,
                    "Sending already-known consensus info to subscriber"
                );
                next_epoch = info.epoch + 1;
                let Ok(message) = SubscriptionMessage::new(NOTIFICATION_METHOD, id.clone(), &info)
                else {
                    warn!(target: "orchestrator::rpc", "Failed to encode subscription message");
                    return;
                };
                if sink.send(message).await.is_err() {
                    info!(target: "orchestrator::rpc", "Subscriber went away during replay");
                    return;
                }
            }

            loop {
                match live.recv().await {
                    Ok(info) => {
                        if info.epoch < next_epoch {
                            continue;
                        }
                        next_epoch = info.epoch + 1;
                        let Ok(message) =
                            SubscriptionMessage::new(NOTIFICATION_METHOD, id.clone(), &info)
                        else {
                            warn!(target: "orchestrator::rpc", "Failed to encode subscription message");
                            return;
                        };
                        if sink.send(message).await.is_err() {
                            info!(target: "orchestrator::rpc", "Unsubscribing disconnected subscriber");
                            return;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!(
                            target: "orchestrator::rpc",
                            missed,
                            "Subscriber lagged on consensus info feed"
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!(target: "orchestrator::rpc", "Consensus info feed closed, ending subscription");
                        return;
                    }
                }
            }
        });

        Ok(())
    }

    async fn confirm_van_block_hashes(
        &self,
        requests: Vec<BlockHash>,
    ) -> RpcResult<Vec<BlockStatus>> {
        self.confirm_block_hashes("ConfirmVanBlockHashes", requests)
    }

    async fn confirm_pan_block_hashes(
        &self,
        requests: Vec<BlockHash>,
    ) -> RpcResult<Vec<BlockStatus>> {
        self.confirm_block_hashes("ConfirmPanBlockHashes", requests)
    }
}
