//! Model for persisted epoch consensus schedules.

use alloy_primitives::FixedBytes;
use bytes::Buf;
use orchestrator_types::{BlsPublicKeyBytes, EpochInfo, BLS_PUBLIC_KEY_SIZE};
use reth_codecs::Compact;
use reth_db::table::Table;
use serde::{Deserialize, Serialize};

/// Durable form of an [`EpochInfo`].
///
/// Stored as the value in the [`EpochInfos`] table; the epoch number is
/// repeated inside the value so a row round-trips without its key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEpochInfo {
    /// Epoch the schedule applies to.
    pub epoch: u64,
    /// Unix timestamp (seconds) of the first slot.
    pub epoch_start_time: u64,
    /// Slot wall-clock length in seconds.
    pub slot_time_duration: u64,
    /// Ordered proposer schedule.
    pub validator_list: Vec<BlsPublicKeyBytes>,
}

impl Compact for StoredEpochInfo {
    fn to_compact<B: bytes::BufMut + AsMut<[u8]>>(&self, buf: &mut B) -> usize {
        buf.put_u64(self.epoch);
        buf.put_u64(self.epoch_start_time);
        buf.put_u64(self.slot_time_duration);
        buf.put_u32(self.validator_list.len() as u32);
        for key in &self.validator_list {
            buf.put_slice(key.as_slice());
        }
        8 + 8 + 8 + 4 + self.validator_list.len() * BLS_PUBLIC_KEY_SIZE
    }

    fn from_compact(mut buf: &[u8], _len: usize) -> (Self, &[u8]) {
        let epoch = buf.get_u64();
        let epoch_start_time = buf.get_u64();
        let slot_time_duration = buf.get_u64();
        let count = buf.get_u32() as usize;
        let mut validator_list = Vec::with_capacity(count);
        for _ in 0..count {
            validator_list.push(FixedBytes::from_slice(&buf[..BLS_PUBLIC_KEY_SIZE]));
            buf.advance(BLS_PUBLIC_KEY_SIZE);
        }
        (Self { epoch, epoch_start_time, slot_time_duration, validator_list }, buf)
    }
}

impl From<&EpochInfo> for StoredEpochInfo {
    fn from(info: &EpochInfo) -> Self {
        Self {
            epoch: info.epoch,
            epoch_start_time: info.epoch_start_time,
            slot_time_duration: info.slot_time_duration,
            validator_list: info.validator_list.clone(),
        }
    }
}

impl From<StoredEpochInfo> for EpochInfo {
    fn from(stored: StoredEpochInfo) -> Self {
        Self {
            epoch: stored.epoch,
            epoch_start_time: stored.epoch_start_time,
            slot_time_duration: stored.slot_time_duration,
            validator_list: stored.validator_list,
        }
    }
}

/// Table of epoch consensus schedules.
///
/// - **Key**: `u64` — epoch number (big-endian on disk)
/// - **Value**: [`StoredEpochInfo`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct EpochInfos;

impl Table for EpochInfos {
    const NAME: &'static str = "epochs";
    const DUPSORT: bool = false;

    type Key = u64;
    type Value = StoredEpochInfo;
}
