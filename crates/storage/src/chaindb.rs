//! Main database access structure.

use crate::{
    error::StorageError,
    models::Tables,
    providers::{CursorProvider, EpochProvider, SlotProvider},
    traits::{
        EpochStorageReader, EpochStorageWriter, OrchestratorStorage, VerdictStorageReader,
        VerdictStorageWriter,
    },
};
use alloy_primitives::B256;
use orchestrator_types::{EpochInfo, SlotVerdict, SLOTS_PER_EPOCH};
use parking_lot::{Mutex, RwLock};
use reth_db::{
    mdbx::{init_db_for, DatabaseArguments},
    DatabaseEnv,
};
use reth_db_api::{database::Database, transaction::DbTxMut};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};
use tracing::info;

/// In-memory mirror of the persisted cursors, kept in lock-step with every
/// verdict write while the store is open.
#[derive(Debug, Clone, Copy, Default)]
struct CursorMirror {
    latest_verified_slot: u64,
    latest_header_hash: B256,
}

/// The orchestrator's durable store.
///
/// One MDBX environment holding epoch schedules, slot verdicts and the two
/// verification cursors. All mutating calls are serialised by a single
/// process-wide lock; reads go through concurrent read transactions.
#[derive(Debug)]
pub struct OrchestratorDb {
    env: DatabaseEnv,
    path: PathBuf,
    write_lock: Mutex<()>,
    cursors: RwLock<CursorMirror>,
}

impl OrchestratorDb {
    /// Creates or opens the database environment at the given path and
    /// recovers the cursor mirror from disk.
    pub fn new(path: &Path) -> Result<Self, StorageError> {
        let env = init_db_for::<_, Tables>(path, DatabaseArguments::default())
            .map_err(|err| StorageError::DatabaseInit(err.to_string()))?;

        let mirror = env.view(|tx| {
            let provider = CursorProvider::new(tx);
            Ok::<_, StorageError>(CursorMirror {
                latest_verified_slot: provider.latest_verified_slot()?,
                latest_header_hash: provider.latest_header_hash()?,
            })
        })??;

        info!(
            target: "orchestrator_storage",
            path = %path.display(),
            latest_verified_slot = mirror.latest_verified_slot,
            "Opened orchestrator database"
        );

        Ok(Self {
            env,
            path: path.to_path_buf(),
            write_lock: Mutex::new(()),
            cursors: RwLock::new(mirror),
        })
    }

    /// Closes the store, releasing the environment.
    pub fn close(self) {
        drop(self);
    }
}

impl EpochStorageReader for OrchestratorDb {
    fn epoch_info(&self, epoch: u64) -> Result<Option<EpochInfo>, StorageError> {
        self.env.view(|tx| EpochProvider::new(tx).epoch_info(epoch))?
    }

    fn epoch_range(&self, from_epoch: u64) -> Result<Vec<EpochInfo>, StorageError> {
        self.env.view(|tx| EpochProvider::new(tx).epoch_range(from_epoch))?
    }

    fn latest_epoch(&self) -> Result<u64, StorageError> {
        self.env.view(|tx| EpochProvider::new(tx).latest_epoch())?
    }
}

impl EpochStorageWriter for OrchestratorDb {
    fn save_epoch_info(&self, info: &EpochInfo) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        self.env.update(|tx| EpochProvider::new(tx).save_epoch_info(info))?
    }
}

impl VerdictStorageReader for OrchestratorDb {
    fn slot_verdict(&self, slot: u64) -> Result<Option<SlotVerdict>, StorageError> {
        self.env.view(|tx| SlotProvider::new(tx).slot_verdict(slot))?
    }

    fn slot_range(&self, from_slot: u64) -> Result<BTreeMap<u64, SlotVerdict>, StorageError> {
        let latest = self.cursors.read().latest_verified_slot;
        if from_slot > latest {
            return Err(StorageError::InvalidSlot(from_slot));
        }
        self.env.view(|tx| SlotProvider::new(tx).slot_range(from_slot, latest))?
    }

    fn first_verified_slot_in_epoch(
        &self,
        epoch: u64,
    ) -> Result<Option<SlotVerdict>, StorageError> {
        self.env.view(|tx| SlotProvider::new(tx).first_verified_slot_in_epoch(epoch))?
    }

    fn latest_verified_slot(&self) -> u64 {
        self.cursors.read().latest_verified_slot
    }

    fn latest_header_hash(&self) -> B256 {
        self.cursors.read().latest_header_hash
    }
}

impl VerdictStorageWriter for OrchestratorDb {
    fn save_slot_verdict(&self, verdict: &SlotVerdict) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();

        let prev = self.cursors.read().latest_verified_slot;
        if verdict.slot < prev {
            return Err(StorageError::InvalidSlot(verdict.slot));
        }

        let new_cursor = self.env.update(|tx| {
            let new_cursor = SlotProvider::new(tx).save_verdict_with_fill(verdict, prev)?;
            let cursors = CursorProvider::new(tx);
            cursors.set_latest_verified_slot(new_cursor)?;
            cursors.set_latest_header_hash(verdict.header_hash)?;
            Ok::<_, StorageError>(new_cursor)
        })??;

        let mut mirror = self.cursors.write();
        mirror.latest_verified_slot = new_cursor;
        mirror.latest_header_hash = verdict.header_hash;
        Ok(())
    }
}

impl OrchestratorStorage for OrchestratorDb {
    fn remove_range(&self, from_epoch: u64, to_epoch: u64) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        self.env.update(|tx| {
            EpochProvider::new(tx).remove_range(from_epoch, to_epoch)?;
            SlotProvider::new(tx).remove_range(
                from_epoch * SLOTS_PER_EPOCH,
                (to_epoch + 1) * SLOTS_PER_EPOCH - 1,
            )
        })?
    }

    fn clear_all(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        self.env.update(|tx| {
            tx.clear::<crate::models::EpochInfos>()?;
            tx.clear::<crate::models::SlotVerdicts>()?;
            tx.clear::<crate::models::Cursors>()?;
            Ok::<_, StorageError>(())
        })??;
        *self.cursors.write() = CursorMirror::default();
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;
    use orchestrator_types::{BlsPublicKeyBytes, VerdictStatus};
    use tempfile::TempDir;

    const HASH_A: B256 = b256!("00000000000000000000000000000000000000000000000000000000000000aa");
    const HASH_B: B256 = b256!("00000000000000000000000000000000000000000000000000000000000000bb");

    fn epoch_info(epoch: u64) -> EpochInfo {
        let mut pk = BlsPublicKeyBytes::ZERO;
        pk[0] = epoch as u8 + 1;
        EpochInfo {
            epoch,
            validator_list: vec![pk],
            epoch_start_time: 1_600_000_000 + epoch * 192,
            slot_time_duration: 6,
        }
    }

    fn setup_db(dir: &TempDir) -> OrchestratorDb {
        OrchestratorDb::new(dir.path()).expect("failed to open database")
    }

    #[test]
    fn create_and_open() {
        let dir = TempDir::new().expect("create temp dir");
        let db = setup_db(&dir);
        assert_eq!(db.latest_verified_slot(), 0);
        assert_eq!(db.latest_header_hash(), B256::ZERO);
        assert_eq!(db.path(), dir.path());
    }

    #[test]
    fn epoch_info_round_trip() {
        let dir = TempDir::new().unwrap();
        let db = setup_db(&dir);

        let info = epoch_info(3);
        db.save_epoch_info(&info).unwrap();
        assert_eq!(db.epoch_info(3).unwrap(), Some(info));
        assert_eq!(db.epoch_info(4).unwrap(), None);
    }

    #[test]
    fn epoch_save_is_idempotent_but_conflicts_on_mutation() {
        let dir = TempDir::new().unwrap();
        let db = setup_db(&dir);

        let info = epoch_info(1);
        db.save_epoch_info(&info).unwrap();
        db.save_epoch_info(&info).unwrap();

        let mut different = info.clone();
        different.epoch_start_time += 1;
        assert!(matches!(
            db.save_epoch_info(&different),
            Err(StorageError::Conflict(_))
        ));
    }

    #[test]
    fn epoch_range_is_ascending_and_bounded() {
        let dir = TempDir::new().unwrap();
        let db = setup_db(&dir);

        for epoch in 0..4 {
            db.save_epoch_info(&epoch_info(epoch)).unwrap();
        }

        let range = db.epoch_range(1).unwrap();
        assert_eq!(range.iter().map(|info| info.epoch).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(db.epoch_range(9).unwrap().is_empty());
        assert_eq!(db.latest_epoch().unwrap(), 3);
    }

    #[test]
    fn verdict_write_advances_cursors() {
        let dir = TempDir::new().unwrap();
        let db = setup_db(&dir);

        db.save_slot_verdict(&SlotVerdict::new(1, HASH_A, VerdictStatus::Verified)).unwrap();
        assert_eq!(db.latest_verified_slot(), 1);
        assert_eq!(db.latest_header_hash(), HASH_A);

        let stored = db.slot_verdict(1).unwrap().unwrap();
        assert_eq!(stored.status, VerdictStatus::Verified);
        assert_eq!(stored.header_hash, HASH_A);
    }

    #[test]
    fn verdict_below_cursor_is_rejected() {
        let dir = TempDir::new().unwrap();
        let db = setup_db(&dir);

        db.save_slot_verdict(&SlotVerdict::new(10, HASH_A, VerdictStatus::Verified)).unwrap();
        assert!(matches!(
            db.save_slot_verdict(&SlotVerdict::new(9, HASH_B, VerdictStatus::Verified)),
            Err(StorageError::InvalidSlot(9))
        ));
    }

    #[test]
    fn gap_is_filled_with_skipped_rows() {
        let dir = TempDir::new().unwrap();
        let db = setup_db(&dir);

        db.save_slot_verdict(&SlotVerdict::new(2, HASH_A, VerdictStatus::Verified)).unwrap();
        db.save_slot_verdict(&SlotVerdict::new(6, HASH_B, VerdictStatus::Verified)).unwrap();

        for slot in 3..6 {
            let verdict = db.slot_verdict(slot).unwrap().unwrap();
            assert_eq!(verdict.status, VerdictStatus::Skipped);
            assert_eq!(verdict.header_hash, B256::ZERO);
        }
        assert_eq!(db.latest_verified_slot(), 6);
    }

    #[test]
    fn rewriting_an_identical_terminal_verdict_is_a_noop() {
        let dir = TempDir::new().unwrap();
        let db = setup_db(&dir);

        let verdict = SlotVerdict::new(4, HASH_A, VerdictStatus::Invalid);
        db.save_slot_verdict(&verdict).unwrap();
        db.save_slot_verdict(&verdict).unwrap();

        assert!(matches!(
            db.save_slot_verdict(&SlotVerdict::new(4, HASH_B, VerdictStatus::Verified)),
            Err(StorageError::Conflict(_))
        ));
    }

    #[test]
    fn slot_range_is_bounded_by_the_cursor() {
        let dir = TempDir::new().unwrap();
        let db = setup_db(&dir);

        db.save_slot_verdict(&SlotVerdict::new(3, HASH_A, VerdictStatus::Verified)).unwrap();

        let range = db.slot_range(1).unwrap();
        assert_eq!(range.len(), 3); // skipped 1, 2 plus verified 3
        assert!(matches!(db.slot_range(4), Err(StorageError::InvalidSlot(4))));
    }

    #[test]
    fn cursors_survive_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let db = setup_db(&dir);
            db.save_slot_verdict(&SlotVerdict::new(100, HASH_A, VerdictStatus::Verified)).unwrap();
            db.close();
        }

        let reopened = setup_db(&dir);
        assert_eq!(reopened.latest_verified_slot(), 100);
        assert_eq!(reopened.latest_header_hash(), HASH_A);
        assert_eq!(reopened.slot_verdict(100).unwrap().unwrap().status, VerdictStatus::Verified);
    }

    #[test]
    fn first_verified_slot_in_epoch_skips_fill_ins() {
        let dir = TempDir::new().unwrap();
        let db = setup_db(&dir);

        // Slot 33 verified; 1..=32 get skipped fill-ins, so epoch 1 starts
        // with a run of skipped rows before the verified one.
        db.save_slot_verdict(&SlotVerdict::new(33, HASH_A, VerdictStatus::Verified)).unwrap();

        let first = db.first_verified_slot_in_epoch(1).unwrap().unwrap();
        assert_eq!(first.slot, 33);
        assert_eq!(db.first_verified_slot_in_epoch(2).unwrap(), None);
    }

    #[test]
    fn remove_range_purges_epochs_and_their_slots() {
        let dir = TempDir::new().unwrap();
        let db = setup_db(&dir);

        for epoch in 0..3 {
            db.save_epoch_info(&epoch_info(epoch)).unwrap();
        }
        db.save_slot_verdict(&SlotVerdict::new(40, HASH_A, VerdictStatus::Verified)).unwrap();

        db.remove_range(1, 2).unwrap();
        assert_eq!(db.epoch_info(0).unwrap(), Some(epoch_info(0)));
        assert_eq!(db.epoch_info(1).unwrap(), None);
        assert_eq!(db.epoch_info(2).unwrap(), None);
        assert_eq!(db.slot_verdict(40).unwrap(), None);
    }

    #[test]
    fn clear_all_resets_everything() {
        let dir = TempDir::new().unwrap();
        let db = setup_db(&dir);

        db.save_epoch_info(&epoch_info(0)).unwrap();
        db.save_slot_verdict(&SlotVerdict::new(5, HASH_A, VerdictStatus::Verified)).unwrap();

        db.clear_all().unwrap();
        assert_eq!(db.latest_verified_slot(), 0);
        assert_eq!(db.latest_header_hash(), B256::ZERO);
        assert_eq!(db.epoch_info(0).unwrap(), None);
        assert_eq!(db.slot_verdict(5).unwrap(), None);
    }
}
