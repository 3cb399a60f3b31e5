//! Long-lived subscriptions to Vanguard's consensus streams.
//!
//! One WS connection carries two concurrent subscriptions: the per-epoch
//! consensus schedules and the pending beacon blocks. Either stream failing
//! tears the connection down and re-enters the dial-retry loop.

use crate::{cache::SlotCache, error::SubscriberError, event::OrchestratorFeeds};
use jsonrpsee::{
    core::client::{Subscription, SubscriptionClientT},
    rpc_params,
    ws_client::WsClientBuilder,
};
use orchestrator_storage::{EpochStorageWriter, VerdictStorageReader};
use orchestrator_types::{BeaconBlock, EpochInfo, ShardInfo};
use parking_lot::RwLock;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const NEW_CONSENSUS_INFO_METHOD: &str = "van_subscribeNewConsensusInfo";
const UNSUB_CONSENSUS_INFO_METHOD: &str = "van_unsubscribeNewConsensusInfo";
const PENDING_BLOCKS_METHOD: &str = "van_subscribePendingBlocks";
const UNSUB_PENDING_BLOCKS_METHOD: &str = "van_unsubscribePendingBlocks";

/// Maintains the connection with the Vanguard chain, persisting epoch
/// schedules and republishing pending shard infos.
#[derive(Debug)]
pub struct VanguardService<DB> {
    endpoint: String,
    reconnect_period: Duration,
    pub(crate) db: Arc<DB>,
    pub(crate) cache: Arc<SlotCache<ShardInfo>>,
    pub(crate) feeds: OrchestratorFeeds,
    cancel_token: CancellationToken,
    connected: AtomicBool,
    run_error: RwLock<Option<String>>,
}

impl<DB> VanguardService<DB>
where
    DB: EpochStorageWriter + VerdictStorageReader + 'static,
{
    /// Creates a new service. Nothing is dialed until [`Self::run`].
    pub fn new(
        endpoint: String,
        reconnect_period: Duration,
        db: Arc<DB>,
        cache: Arc<SlotCache<ShardInfo>>,
        feeds: OrchestratorFeeds,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            endpoint,
            reconnect_period,
            db,
            cache,
            feeds,
            cancel_token,
            connected: AtomicBool::new(false),
            run_error: RwLock::new(None),
        }
    }

    /// Last error of the subscription loop, `None` while healthy.
    pub fn status(&self) -> Option<String> {
        self.run_error.read().clone()
    }

    /// Whether both upstream subscriptions are currently established.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Dial-subscribe-stream loop. Returns only on cancellation.
    pub async fn run(&self) {
        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    info!(target: "orchestrator::vanguard", "Cancellation requested, stopping Vanguard service");
                    return;
                }
                result = self.connect_and_stream() => {
                    self.connected.store(false, Ordering::Relaxed);
                    let err = match result {
                        Err(err) => err,
                        Ok(()) => SubscriberError::StreamClosed,
                    };
                    warn!(
                        target: "orchestrator::vanguard",
                        endpoint = %self.endpoint,
                        %err,
                        "Could not connect or subscribe to Vanguard chain, retrying"
                    );
                    *self.run_error.write() = Some(err.to_string());
                    metrics::counter!("orchestrator_vanguard_reconnects_total").increment(1);
                }
            }

            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    info!(target: "orchestrator::vanguard", "Cancellation requested during backoff, stopping");
                    return;
                }
                _ = tokio::time::sleep(self.reconnect_period) => {}
            }
        }
    }

    async fn connect_and_stream(&self) -> Result<(), SubscriberError> {
        debug!(target: "orchestrator::vanguard", endpoint = %self.endpoint, "Dialing Vanguard node");
        let client = WsClientBuilder::default().build(&self.endpoint).await?;

        let mut info_sub: Subscription<EpochInfo> = client
            .subscribe(NEW_CONSENSUS_INFO_METHOD, rpc_params![], UNSUB_CONSENSUS_INFO_METHOD)
            .await?;
        let mut block_sub: Subscription<BeaconBlock> = client
            .subscribe(PENDING_BLOCKS_METHOD, rpc_params![], UNSUB_PENDING_BLOCKS_METHOD)
            .await?;

        self.connected.store(true, Ordering::Relaxed);
        *self.run_error.write() = None;
        info!(
            target: "orchestrator::vanguard",
            endpoint = %self.endpoint,
            "Connected and subscribed to Vanguard chain"
        );

        loop {
            tokio::select! {
                maybe_info = info_sub.next() => match maybe_info {
                    Some(Ok(info)) => self.on_new_consensus_info(&info),
                    Some(Err(err)) => return Err(err.into()),
                    None => return Err(SubscriberError::StreamClosed),
                },
                maybe_block = block_sub.next() => match maybe_block {
                    Some(Ok(block)) => self.on_new_pending_block(&block),
                    Some(Err(err)) => return Err(err.into()),
                    None => return Err(SubscriberError::StreamClosed),
                },
            }
        }
    }
}
