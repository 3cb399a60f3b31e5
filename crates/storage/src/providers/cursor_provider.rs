//! Provider for the persisted verification cursors.

use crate::{
    error::StorageError,
    models::{CursorKey, CursorValue, Cursors},
};
use alloy_primitives::B256;
use reth_db_api::transaction::{DbTx, DbTxMut};
use tracing::error;

/// Reads and writes the two cursor rows within a transaction.
#[derive(Debug)]
pub(crate) struct CursorProvider<'tx, TX> {
    tx: &'tx TX,
}

impl<'tx, TX> CursorProvider<'tx, TX> {
    pub(crate) const fn new(tx: &'tx TX) -> Self {
        Self { tx }
    }
}

impl<TX> CursorProvider<'_, TX>
where
    TX: DbTx,
{
    /// Latest verified slot, zero on a brand-new database.
    pub(crate) fn latest_verified_slot(&self) -> Result<u64, StorageError> {
        let value = self.tx.get::<Cursors>(CursorKey::LatestVerifiedSlot).map_err(|err| {
            error!(target: "orchestrator_storage", %err, "Failed to read slot cursor");
            StorageError::Database(err)
        })?;
        match value {
            Some(CursorValue::Slot(slot)) => Ok(slot),
            _ => Ok(0),
        }
    }

    /// Latest verified header hash, zero on a brand-new database.
    pub(crate) fn latest_header_hash(&self) -> Result<B256, StorageError> {
        let value = self.tx.get::<Cursors>(CursorKey::LatestHeaderHash).map_err(|err| {
            error!(target: "orchestrator_storage", %err, "Failed to read hash cursor");
            StorageError::Database(err)
        })?;
        match value {
            Some(CursorValue::HeaderHash(hash)) => Ok(hash),
            _ => Ok(B256::ZERO),
        }
    }
}

impl<TX> CursorProvider<'_, TX>
where
    TX: DbTxMut,
{
    pub(crate) fn set_latest_verified_slot(&self, slot: u64) -> Result<(), StorageError> {
        self.tx
            .put::<Cursors>(CursorKey::LatestVerifiedSlot, CursorValue::Slot(slot))
            .map_err(|err| {
                error!(target: "orchestrator_storage", slot, %err, "Failed to store slot cursor");
                StorageError::Database(err)
            })
    }

    pub(crate) fn set_latest_header_hash(&self, hash: B256) -> Result<(), StorageError> {
        self.tx
            .put::<Cursors>(CursorKey::LatestHeaderHash, CursorValue::HeaderHash(hash))
            .map_err(|err| {
                error!(target: "orchestrator_storage", %hash, %err, "Failed to store hash cursor");
                StorageError::Database(err)
            })
    }
}
