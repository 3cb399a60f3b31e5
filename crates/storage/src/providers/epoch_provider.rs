//! Provider for epoch-schedule database operations.

use crate::{
    error::StorageError,
    models::{EpochInfos, StoredEpochInfo},
};
use orchestrator_types::EpochInfo;
use reth_db_api::{
    cursor::DbCursorRO,
    transaction::{DbTx, DbTxMut},
};
use tracing::{error, warn};

/// Provides access to epoch schedules within a transaction.
#[derive(Debug)]
pub(crate) struct EpochProvider<'tx, TX> {
    tx: &'tx TX,
}

impl<'tx, TX> EpochProvider<'tx, TX> {
    pub(crate) const fn new(tx: &'tx TX) -> Self {
        Self { tx }
    }
}

impl<TX> EpochProvider<'_, TX>
where
    TX: DbTx,
{
    /// Gets the schedule for `epoch`, if any.
    pub(crate) fn epoch_info(&self, epoch: u64) -> Result<Option<EpochInfo>, StorageError> {
        let stored = self.tx.get::<EpochInfos>(epoch).map_err(|err| {
            error!(target: "orchestrator_storage", epoch, %err, "Failed to get epoch info");
            StorageError::Database(err)
        })?;
        Ok(stored.map(Into::into))
    }

    /// All known schedules for epochs `>= from_epoch`, ascending.
    ///
    /// Empty when `from_epoch` is past the latest known epoch.
    pub(crate) fn epoch_range(&self, from_epoch: u64) -> Result<Vec<EpochInfo>, StorageError> {
        let mut cursor = self.tx.cursor_read::<EpochInfos>().map_err(|err| {
            error!(target: "orchestrator_storage", %err, "Failed to open epoch cursor");
            StorageError::Database(err)
        })?;

        let mut infos = Vec::new();
        for row in cursor.walk_range(from_epoch..).map_err(StorageError::Database)? {
            let (_, stored) = row.map_err(StorageError::Database)?;
            infos.push(stored.into());
        }
        Ok(infos)
    }

    /// The highest epoch with a stored schedule, zero when none exist.
    pub(crate) fn latest_epoch(&self) -> Result<u64, StorageError> {
        let mut cursor = self.tx.cursor_read::<EpochInfos>().map_err(|err| {
            error!(target: "orchestrator_storage", %err, "Failed to open epoch cursor");
            StorageError::Database(err)
        })?;
        let last = cursor.last().map_err(StorageError::Database)?;
        Ok(last.map(|(epoch, _)| epoch).unwrap_or_default())
    }
}

impl<TX> EpochProvider<'_, TX>
where
    TX: DbTxMut + DbTx,
{
    /// Saves the schedule for an epoch.
    ///
    /// Saving an identical payload twice is a no-op; a different payload for
    /// an already-stored epoch is a conflict.
    pub(crate) fn save_epoch_info(&self, info: &EpochInfo) -> Result<(), StorageError> {
        let incoming = StoredEpochInfo::from(info);

        if let Some(existing) = self.tx.get::<EpochInfos>(info.epoch).map_err(|err| {
            error!(target: "orchestrator_storage", epoch = info.epoch, %err, "Failed to get epoch info");
            StorageError::Database(err)
        })? {
            if existing == incoming {
                return Ok(());
            }
            warn!(
                target: "orchestrator_storage",
                epoch = info.epoch,
                "Epoch already holds a different schedule"
            );
            return Err(StorageError::Conflict(format!(
                "epoch {} already holds a different schedule",
                info.epoch
            )));
        }

        self.tx.put::<EpochInfos>(info.epoch, incoming).map_err(|err| {
            error!(target: "orchestrator_storage", epoch = info.epoch, %err, "Failed to save epoch info");
            StorageError::Database(err)
        })
    }

    /// Removes all schedules with `from_epoch <= epoch <= to_epoch`.
    pub(crate) fn remove_range(&self, from_epoch: u64, to_epoch: u64) -> Result<(), StorageError> {
        let mut cursor = self.tx.cursor_read::<EpochInfos>().map_err(|err| {
            error!(target: "orchestrator_storage", %err, "Failed to open epoch cursor");
            StorageError::Database(err)
        })?;

        let mut doomed = Vec::new();
        for row in cursor.walk_range(from_epoch..=to_epoch).map_err(StorageError::Database)? {
            let (epoch, _) = row.map_err(StorageError::Database)?;
            doomed.push(epoch);
        }
        for epoch in doomed {
            self.tx.delete::<EpochInfos>(epoch, None).map_err(|err| {
                error!(target: "orchestrator_storage", epoch, %err, "Failed to delete epoch info");
                StorageError::Database(err)
            })?;
        }
        Ok(())
    }
}
