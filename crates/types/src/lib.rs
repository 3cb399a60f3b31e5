//! Core types shared across orchestrator components.
//!
//! This crate defines the data model exchanged between the Pandora
//! (execution) and Vanguard (consensus) subscribers, the verifier, the
//! durable store and the notification RPC.

mod primitives;
pub use primitives::{BlsPublicKeyBytes, BlsSignatureBytes, BLS_PUBLIC_KEY_SIZE, BLS_SIGNATURE_SIZE};

mod consensus;
pub use consensus::{
    epoch_for_slot, BeaconBlock, BeaconBlockBody, EpochInfo, PandoraShard, ShardInfo,
    SLOTS_PER_EPOCH,
};

mod execution;
pub use execution::{
    signing_root, ExtraData, ExtraDataError, ExtraDataWithSig, PendingHeader, PendingHeaderFilter,
};

mod verdict;
pub use verdict::{SlotVerdict, VerdictStatus};
