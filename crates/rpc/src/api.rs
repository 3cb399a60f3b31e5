//! [`OrchestratorApi`] trait describing the downstream notification surface.

use crate::response::{BlockHash, BlockStatus};
use jsonrpsee::{
    core::{RpcResult, SubscriptionResult},
    proc_macros::rpc,
};
use orchestrator_types::EpochInfo;

/// The orchestrator's public API. The proc macro generates both the client
/// and the server glue; the default namespace separator is `_`.
#[rpc(client, server, namespace = "orc")]
pub trait OrchestratorApi {
    /// Streams every known epoch schedule starting at `from_epoch` in
    /// ascending order, then keeps streaming schedules as they arrive.
    #[subscription(
        name = "minimalConsensusInfo",
        unsubscribe = "unsubscribeMinimalConsensusInfo",
        item = EpochInfo
    )]
    async fn minimal_consensus_info(&self, from_epoch: u64) -> SubscriptionResult;

    /// Confirms the status of Vanguard block hashes against the persisted
    /// slot verdicts.
    #[method(name = "confirmVanBlockHashes")]
    async fn confirm_van_block_hashes(
        &self,
        requests: Vec<BlockHash>,
    ) -> RpcResult<Vec<BlockStatus>>;

    /// Confirms the status of Pandora block hashes against the persisted
    /// slot verdicts.
    #[method(name = "confirmPanBlockHashes")]
    async fn confirm_pan_block_hashes(
        &self,
        requests: Vec<BlockHash>,
    ) -> RpcResult<Vec<BlockStatus>>;
}
