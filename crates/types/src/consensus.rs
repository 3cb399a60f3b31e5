//! Types delivered by the Vanguard (consensus) chain.

use crate::primitives::{BlsPublicKeyBytes, BlsSignatureBytes};
use alloy_primitives::{keccak256, B256};
use alloy_rlp::{RlpDecodable, RlpEncodable};
use serde::{Deserialize, Serialize};

/// Number of slots in one consensus epoch.
pub const SLOTS_PER_EPOCH: u64 = 32;

/// Returns the epoch containing the given slot.
pub const fn epoch_for_slot(slot: u64) -> u64 {
    slot / SLOTS_PER_EPOCH
}

/// Minimal consensus schedule for one epoch, as published by Vanguard.
///
/// Immutable once produced; keyed by `epoch`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpochInfo {
    /// The epoch this schedule applies to.
    pub epoch: u64,
    /// Ordered proposer schedule; `validator_list[slot % len]` proposes `slot`.
    pub validator_list: Vec<BlsPublicKeyBytes>,
    /// Unix timestamp (seconds) of the first slot of the epoch.
    #[serde(rename = "epochTimeStart")]
    pub epoch_start_time: u64,
    /// Wall-clock length of a single slot, in seconds.
    #[serde(rename = "slotTimeDuration")]
    pub slot_time_duration: u64,
}

impl EpochInfo {
    /// Unix timestamp (seconds) at which the epoch ends.
    pub const fn end_time(&self) -> u64 {
        self.epoch_start_time + SLOTS_PER_EPOCH * self.slot_time_duration
    }

    /// The proposer public key for `slot`, or `None` for an empty schedule.
    pub fn proposer(&self, slot: u64) -> Option<&BlsPublicKeyBytes> {
        if self.validator_list.is_empty() {
            return None;
        }
        let index = (slot % self.validator_list.len() as u64) as usize;
        self.validator_list.get(index)
    }
}

/// Per-slot execution-layer metadata embedded in a Vanguard block body.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, RlpEncodable, RlpDecodable,
)]
#[serde(rename_all = "camelCase")]
pub struct PandoraShard {
    /// Execution block number the shard commits to.
    pub block_number: u64,
    /// Parent hash of the execution header.
    pub parent_hash: B256,
    /// State root of the execution header.
    pub state_root: B256,
    /// Receipts root of the execution header.
    pub receipt_hash: B256,
    /// Transactions root of the execution header.
    pub tx_hash: B256,
    /// Proposer BLS signature over the execution header.
    pub signature: BlsSignatureBytes,
}

/// Body of a Vanguard beacon block, reduced to the fields the orchestrator
/// consumes.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, RlpEncodable, RlpDecodable,
)]
#[serde(rename_all = "camelCase")]
pub struct BeaconBlockBody {
    /// Execution shard commitments; the first entry is the one that counts.
    pub pandora_shard: Vec<PandoraShard>,
}

/// A Vanguard beacon block as delivered on the pending-blocks stream.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, RlpEncodable, RlpDecodable,
)]
#[serde(rename_all = "camelCase")]
pub struct BeaconBlock {
    /// Consensus slot of the block.
    pub slot: u64,
    /// Block body.
    pub body: BeaconBlockBody,
}

impl BeaconBlock {
    /// Canonical root of the block: keccak over its RLP encoding.
    pub fn block_root(&self) -> B256 {
        keccak256(alloy_rlp::encode(self))
    }
}

/// Shard info extracted from a pending Vanguard block, stamped with the
/// block's slot and root. This is what the verifier matches against the
/// Pandora side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardInfo {
    /// Consensus slot.
    pub slot: u64,
    /// Execution block number committed by the shard.
    pub block_number: u64,
    /// Parent hash committed by the shard.
    pub parent_hash: B256,
    /// State root committed by the shard.
    pub state_root: B256,
    /// Receipts root committed by the shard.
    pub receipt_hash: B256,
    /// Transactions root committed by the shard.
    pub tx_hash: B256,
    /// Proposer BLS signature carried by the shard.
    pub signature: BlsSignatureBytes,
    /// Root of the Vanguard block the shard arrived in.
    pub block_root: B256,
}

impl ShardInfo {
    /// Builds a [`ShardInfo`] from the first shard of `block`.
    ///
    /// Returns `None` when the block carries no shard commitments.
    pub fn from_block(block: &BeaconBlock) -> Option<Self> {
        let shard = block.body.pandora_shard.first()?;
        Some(Self {
            slot: block.slot,
            block_number: shard.block_number,
            parent_hash: shard.parent_hash,
            state_root: shard.state_root,
            receipt_hash: shard.receipt_hash,
            tx_hash: shard.tx_hash,
            signature: shard.signature,
            block_root: block.block_root(),
        })
    }
}
