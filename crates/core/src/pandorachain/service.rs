//! Long-lived subscription to Pandora's pending-header stream.
//!
//! The service dials the configured WS endpoint, subscribes with a
//! `fromBlockHash` filter resuming at the latest verified header, and pushes
//! every arriving header into the exec-side cache and onto the pending-header
//! feed. Any transport failure drops back into a dial-retry loop.

use crate::{cache::SlotCache, error::SubscriberError, event::Feed};
use alloy_consensus::Header;
use jsonrpsee::{
    core::client::{Subscription, SubscriptionClientT},
    rpc_params,
    ws_client::WsClientBuilder,
};
use orchestrator_storage::VerdictStorageReader;
use orchestrator_types::{PendingHeader, PendingHeaderFilter};
use parking_lot::RwLock;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Maintains the connection with the Pandora chain and republishes its
/// pending headers.
#[derive(Debug)]
pub struct PandoraService<DB> {
    endpoint: String,
    namespace: String,
    reconnect_period: Duration,
    db: Arc<DB>,
    cache: Arc<SlotCache<PendingHeader>>,
    feed: Feed<PendingHeader>,
    cancel_token: CancellationToken,
    connected: AtomicBool,
    run_error: RwLock<Option<String>>,
}

impl<DB> PandoraService<DB>
where
    DB: VerdictStorageReader + 'static,
{
    /// Creates a new service. Nothing is dialed until [`Self::run`].
    pub fn new(
        endpoint: String,
        namespace: String,
        reconnect_period: Duration,
        db: Arc<DB>,
        cache: Arc<SlotCache<PendingHeader>>,
        feed: Feed<PendingHeader>,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            endpoint,
            namespace,
            reconnect_period,
            db,
            cache,
            feed,
            cancel_token,
            connected: AtomicBool::new(false),
            run_error: RwLock::new(None),
        }
    }

    /// Last error of the subscription loop, `None` while healthy.
    pub fn status(&self) -> Option<String> {
        self.run_error.read().clone()
    }

    /// Whether the upstream subscription is currently established.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Dial-subscribe-stream loop. Returns only on cancellation.
    pub async fn run(&self) {
        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    info!(target: "orchestrator::pandora", "Cancellation requested, stopping Pandora service");
                    return;
                }
                result = self.connect_and_stream() => {
                    self.connected.store(false, Ordering::Relaxed);
                    let err = match result {
                        Err(err) => err,
                        Ok(()) => SubscriberError::StreamClosed,
                    };
                    warn!(
                        target: "orchestrator::pandora",
                        endpoint = %self.endpoint,
                        %err,
                        "Could not connect or subscribe to Pandora chain, retrying"
                    );
                    *self.run_error.write() = Some(err.to_string());
                    metrics::counter!("orchestrator_pandora_reconnects_total").increment(1);
                }
            }

            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    info!(target: "orchestrator::pandora", "Cancellation requested during backoff, stopping");
                    return;
                }
                _ = tokio::time::sleep(self.reconnect_period) => {}
            }
        }
    }

    async fn connect_and_stream(&self) -> Result<(), SubscriberError> {
        debug!(target: "orchestrator::pandora", endpoint = %self.endpoint, "Dialing Pandora node");
        let client = WsClientBuilder::default().build(&self.endpoint).await?;

        let filter = PendingHeaderFilter { from_block_hash: self.db.latest_header_hash() };
        let subscribe_method = format!("{}_getPendingBlockHeaders", self.namespace);
        let unsubscribe_method = format!("{}_unsubscribePendingBlockHeaders", self.namespace);
        let mut subscription: Subscription<Header> = client
            .subscribe(&subscribe_method, rpc_params![filter], &unsubscribe_method)
            .await?;

        self.connected.store(true, Ordering::Relaxed);
        *self.run_error.write() = None;
        info!(
            target: "orchestrator::pandora",
            endpoint = %self.endpoint,
            from_block_hash = %filter.from_block_hash,
            "Connected and subscribed to Pandora chain"
        );

        loop {
            match subscription.next().await {
                Some(Ok(header)) => self.on_pending_header(header),
                Some(Err(err)) => return Err(err.into()),
                None => return Err(SubscriberError::StreamClosed),
            }
        }
    }

    /// Stamps an incoming header and republishes it.
    fn on_pending_header(&self, header: Header) {
        let pending = match PendingHeader::from_header(header) {
            Ok(pending) => pending,
            Err(err) => {
                warn!(
                    target: "orchestrator::pandora",
                    %err,
                    "Dropping pending header with undecodable extra data"
                );
                return;
            }
        };

        metrics::counter!("orchestrator_pandora_headers_total").increment(1);
        self.cache.put(pending.slot, pending.clone());
        let delivered = self.feed.send(pending.clone());
        trace!(
            target: "orchestrator::pandora",
            slot = pending.slot,
            hash = %pending.hash,
            delivered,
            "Cached and published pending Pandora header"
        );
    }
}
