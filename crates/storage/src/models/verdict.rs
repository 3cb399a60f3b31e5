//! Model for persisted slot verdicts.

use alloy_primitives::B256;
use bytes::Buf;
use orchestrator_types::{SlotVerdict, VerdictStatus};
use reth_codecs::Compact;
use reth_db::table::Table;
use serde::{Deserialize, Serialize};

/// Durable form of a [`SlotVerdict`]; the slot lives in the table key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSlotVerdict {
    /// Hash of the Pandora header the verdict refers to.
    pub header_hash: B256,
    /// Outcome of the cross-check.
    pub status: VerdictStatus,
}

const STATUS_PENDING: u8 = 0;
const STATUS_VERIFIED: u8 = 1;
const STATUS_INVALID: u8 = 2;
const STATUS_SKIPPED: u8 = 3;

fn status_to_byte(status: VerdictStatus) -> u8 {
    match status {
        VerdictStatus::Pending => STATUS_PENDING,
        VerdictStatus::Verified => STATUS_VERIFIED,
        VerdictStatus::Invalid => STATUS_INVALID,
        VerdictStatus::Skipped => STATUS_SKIPPED,
    }
}

fn status_from_byte(byte: u8) -> VerdictStatus {
    match byte {
        STATUS_VERIFIED => VerdictStatus::Verified,
        STATUS_INVALID => VerdictStatus::Invalid,
        STATUS_SKIPPED => VerdictStatus::Skipped,
        _ => VerdictStatus::Pending,
    }
}

impl Compact for StoredSlotVerdict {
    fn to_compact<B: bytes::BufMut + AsMut<[u8]>>(&self, buf: &mut B) -> usize {
        buf.put_slice(self.header_hash.as_slice());
        buf.put_u8(status_to_byte(self.status));
        32 + 1
    }

    fn from_compact(mut buf: &[u8], _len: usize) -> (Self, &[u8]) {
        let header_hash = B256::from_slice(&buf[..32]);
        buf.advance(32);
        let status = status_from_byte(buf.get_u8());
        (Self { header_hash, status }, buf)
    }
}

impl StoredSlotVerdict {
    /// Rehydrates the full verdict for `slot`.
    pub const fn into_verdict(self, slot: u64) -> SlotVerdict {
        SlotVerdict { slot, header_hash: self.header_hash, status: self.status }
    }
}

impl From<&SlotVerdict> for StoredSlotVerdict {
    fn from(verdict: &SlotVerdict) -> Self {
        Self { header_hash: verdict.header_hash, status: verdict.status }
    }
}

/// Table of per-slot verdicts.
///
/// - **Key**: `u64` — slot number (big-endian on disk)
/// - **Value**: [`StoredSlotVerdict`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct SlotVerdicts;

impl Table for SlotVerdicts {
    const NAME: &'static str = "slots";
    const DUPSORT: bool = false;

    type Key = u64;
    type Value = StoredSlotVerdict;
}
