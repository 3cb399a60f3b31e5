//! Storage trait seams consumed by the subscribers, the verifier and the RPC
//! backend.

use crate::StorageError;
use alloy_primitives::B256;
use orchestrator_types::{EpochInfo, SlotVerdict};
use std::{collections::BTreeMap, fmt::Debug, path::Path};

/// Read access to epoch consensus schedules.
pub trait EpochStorageReader: Send + Sync {
    /// Gets the schedule for `epoch`, if it has been saved.
    fn epoch_info(&self, epoch: u64) -> Result<Option<EpochInfo>, StorageError>;

    /// All known schedules for epochs `>= from_epoch` in ascending order;
    /// empty when `from_epoch` exceeds the latest known epoch.
    fn epoch_range(&self, from_epoch: u64) -> Result<Vec<EpochInfo>, StorageError>;

    /// The highest epoch with a stored schedule.
    fn latest_epoch(&self) -> Result<u64, StorageError>;
}

/// Write access to epoch consensus schedules.
pub trait EpochStorageWriter: Send + Sync {
    /// Saves a schedule. Idempotent for identical payloads; a different
    /// payload for an existing epoch fails with [`StorageError::Conflict`].
    fn save_epoch_info(&self, info: &EpochInfo) -> Result<(), StorageError>;
}

/// Read access to slot verdicts and the verification cursors.
pub trait VerdictStorageReader: Send + Sync {
    /// Gets the verdict for `slot`, if one has been written.
    fn slot_verdict(&self, slot: u64) -> Result<Option<SlotVerdict>, StorageError>;

    /// Verdicts for `from_slot..=latest_verified_slot`, keyed by slot.
    ///
    /// Fails with [`StorageError::InvalidSlot`] when `from_slot` is past the
    /// cursor.
    fn slot_range(&self, from_slot: u64) -> Result<BTreeMap<u64, SlotVerdict>, StorageError>;

    /// The first `Verified` slot within `epoch`, if any.
    fn first_verified_slot_in_epoch(
        &self,
        epoch: u64,
    ) -> Result<Option<SlotVerdict>, StorageError>;

    /// Highest slot covered by a verdict; served from the in-memory mirror.
    fn latest_verified_slot(&self) -> u64;

    /// Header hash behind the latest verdict; served from the in-memory
    /// mirror.
    fn latest_header_hash(&self) -> B256;
}

/// Write access to slot verdicts.
pub trait VerdictStorageWriter: Send + Sync {
    /// Writes a verdict, filling skipped slots and advancing the cursors in
    /// one atomic unit. Fails with [`StorageError::InvalidSlot`] below the
    /// cursor and [`StorageError::Conflict`] when a terminal verdict would
    /// be rewritten differently.
    fn save_slot_verdict(&self, verdict: &SlotVerdict) -> Result<(), StorageError>;
}

/// Full access to the orchestrator store, including administrative calls.
pub trait OrchestratorStorage:
    EpochStorageReader + EpochStorageWriter + VerdictStorageReader + VerdictStorageWriter + Debug
{
    /// Purges epoch schedules `from_epoch..=to_epoch` together with the slot
    /// verdicts those epochs cover.
    fn remove_range(&self, from_epoch: u64, to_epoch: u64) -> Result<(), StorageError>;

    /// Drops every row in every table and resets the cursors.
    fn clear_all(&self) -> Result<(), StorageError>;

    /// Filesystem location of the database.
    fn path(&self) -> &Path;
}
