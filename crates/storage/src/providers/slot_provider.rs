//! Provider for slot-verdict database operations.

use crate::{
    error::StorageError,
    models::{SlotVerdicts, StoredSlotVerdict},
};
use orchestrator_types::{SlotVerdict, VerdictStatus, SLOTS_PER_EPOCH};
use reth_db_api::{
    cursor::DbCursorRO,
    transaction::{DbTx, DbTxMut},
};
use std::collections::BTreeMap;
use tracing::{error, warn};

/// Provides access to slot verdicts within a transaction.
#[derive(Debug)]
pub(crate) struct SlotProvider<'tx, TX> {
    tx: &'tx TX,
}

impl<'tx, TX> SlotProvider<'tx, TX> {
    pub(crate) const fn new(tx: &'tx TX) -> Self {
        Self { tx }
    }
}

impl<TX> SlotProvider<'_, TX>
where
    TX: DbTx,
{
    /// Gets the verdict for `slot`, if any.
    pub(crate) fn slot_verdict(&self, slot: u64) -> Result<Option<SlotVerdict>, StorageError> {
        let stored = self.tx.get::<SlotVerdicts>(slot).map_err(|err| {
            error!(target: "orchestrator_storage", slot, %err, "Failed to get slot verdict");
            StorageError::Database(err)
        })?;
        Ok(stored.map(|row| row.into_verdict(slot)))
    }

    /// All verdicts with `from_slot <= slot <= to_slot`, keyed by slot.
    pub(crate) fn slot_range(
        &self,
        from_slot: u64,
        to_slot: u64,
    ) -> Result<BTreeMap<u64, SlotVerdict>, StorageError> {
        let mut cursor = self.tx.cursor_read::<SlotVerdicts>().map_err(|err| {
            error!(target: "orchestrator_storage", %err, "Failed to open slot cursor");
            StorageError::Database(err)
        })?;

        let mut verdicts = BTreeMap::new();
        for row in cursor.walk_range(from_slot..=to_slot).map_err(StorageError::Database)? {
            let (slot, stored) = row.map_err(StorageError::Database)?;
            verdicts.insert(slot, stored.into_verdict(slot));
        }
        Ok(verdicts)
    }

    /// The first slot of `epoch` that carries a `Verified` verdict.
    pub(crate) fn first_verified_slot_in_epoch(
        &self,
        epoch: u64,
    ) -> Result<Option<SlotVerdict>, StorageError> {
        let from = epoch * SLOTS_PER_EPOCH;
        let verdicts = self.slot_range(from, from + SLOTS_PER_EPOCH - 1)?;
        Ok(verdicts.into_values().find(|verdict| verdict.status == VerdictStatus::Verified))
    }
}

impl<TX> SlotProvider<'_, TX>
where
    TX: DbTxMut + DbTx,
{
    /// Writes `verdict` and fills every missing slot between the previous
    /// cursor and the verdict's slot with a `Skipped` row.
    ///
    /// The fill-in is keyed on the existing rows, so re-running it over an
    /// already-written range is a no-op. Terminal rows are immutable: an
    /// attempt to replace one with a different verdict is a conflict, while
    /// an identical rewrite returns early.
    ///
    /// Returns the new cursor position, `max(prev_cursor, verdict.slot)`.
    pub(crate) fn save_verdict_with_fill(
        &self,
        verdict: &SlotVerdict,
        prev_cursor: u64,
    ) -> Result<u64, StorageError> {
        if let Some(existing) = self.slot_verdict(verdict.slot)? {
            if existing == *verdict {
                return Ok(prev_cursor.max(verdict.slot));
            }
            if existing.status.is_terminal() {
                warn!(
                    target: "orchestrator_storage",
                    slot = verdict.slot,
                    existing = %existing.status,
                    incoming = %verdict.status,
                    "Refusing to overwrite terminal verdict"
                );
                return Err(StorageError::Conflict(format!(
                    "slot {} already holds a terminal verdict",
                    verdict.slot
                )));
            }
        }

        for slot in (prev_cursor + 1)..verdict.slot {
            if self.slot_verdict(slot)?.is_none() {
                self.put(&SlotVerdict::skipped(slot))?;
            }
        }
        self.put(verdict)?;
        Ok(prev_cursor.max(verdict.slot))
    }

    /// Removes all verdicts with `from_slot <= slot <= to_slot`.
    pub(crate) fn remove_range(&self, from_slot: u64, to_slot: u64) -> Result<(), StorageError> {
        let mut cursor = self.tx.cursor_read::<SlotVerdicts>().map_err(|err| {
            error!(target: "orchestrator_storage", %err, "Failed to open slot cursor");
            StorageError::Database(err)
        })?;

        let mut doomed = Vec::new();
        for row in cursor.walk_range(from_slot..=to_slot).map_err(StorageError::Database)? {
            let (slot, _) = row.map_err(StorageError::Database)?;
            doomed.push(slot);
        }
        for slot in doomed {
            self.tx.delete::<SlotVerdicts>(slot, None).map_err(|err| {
                error!(target: "orchestrator_storage", slot, %err, "Failed to delete slot verdict");
                StorageError::Database(err)
            })?;
        }
        Ok(())
    }

    fn put(&self, verdict: &SlotVerdict) -> Result<(), StorageError> {
        self.tx.put::<SlotVerdicts>(verdict.slot, StoredSlotVerdict::from(verdict)).map_err(
            |err| {
                error!(
                    target: "orchestrator_storage",
                    slot = verdict.slot,
                    %err,
                    "Failed to save slot verdict"
                );
                StorageError::Database(err)
            },
        )
    }
}
