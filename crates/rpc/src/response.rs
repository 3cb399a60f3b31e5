//! Request and response payloads of the confirmation endpoints.

use alloy_primitives::B256;
use orchestrator_types::VerdictStatus;
use serde::{Deserialize, Serialize};

/// A (slot, hash) pair a client wants confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHash {
    /// Consensus slot the hash belongs to.
    pub slot: u64,
    /// Block hash as known to the client.
    pub hash: B256,
}

/// Confirmation result for one requested pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockStatus {
    /// The request this status answers.
    #[serde(flatten)]
    pub block_hash: BlockHash,
    /// The orchestrator's verdict for the pair.
    pub status: VerdictStatus,
}
