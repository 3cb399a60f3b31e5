//! Model for the two persisted verification cursors.

use alloy_primitives::B256;
use bytes::Buf;
use reth_codecs::Compact;
use reth_db::table::Table;
use reth_db_api::{
    table::{Decode, Encode},
    DatabaseError,
};
use serde::{Deserialize, Serialize};

const LATEST_VERIFIED_SLOT_KEY: &[u8] = b"latest-verified-slot";
const LATEST_HEADER_HASH_KEY: &[u8] = b"latest-header-hash";

/// Key selecting one of the persisted cursors.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum CursorKey {
    /// Highest slot with a terminal or skipped verdict.
    LatestVerifiedSlot,
    /// Hash of the Pandora header behind the latest verdict.
    LatestHeaderHash,
}

impl Encode for CursorKey {
    type Encoded = &'static [u8];

    fn encode(self) -> Self::Encoded {
        match self {
            Self::LatestVerifiedSlot => LATEST_VERIFIED_SLOT_KEY,
            Self::LatestHeaderHash => LATEST_HEADER_HASH_KEY,
        }
    }
}

impl Decode for CursorKey {
    fn decode(value: &[u8]) -> Result<Self, DatabaseError> {
        match value {
            LATEST_VERIFIED_SLOT_KEY => Ok(Self::LatestVerifiedSlot),
            LATEST_HEADER_HASH_KEY => Ok(Self::LatestHeaderHash),
            _ => Err(DatabaseError::Decode),
        }
    }
}

/// Cursor payload; the variant must match its [`CursorKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CursorValue {
    /// Slot number payload.
    Slot(u64),
    /// Header hash payload.
    HeaderHash(B256),
}

impl Default for CursorValue {
    fn default() -> Self {
        Self::Slot(0)
    }
}

const TAG_SLOT: u8 = 0;
const TAG_HASH: u8 = 1;

impl Compact for CursorValue {
    fn to_compact<B: bytes::BufMut + AsMut<[u8]>>(&self, buf: &mut B) -> usize {
        match self {
            Self::Slot(slot) => {
                buf.put_u8(TAG_SLOT);
                buf.put_u64(*slot);
                1 + 8
            }
            Self::HeaderHash(hash) => {
                buf.put_u8(TAG_HASH);
                buf.put_slice(hash.as_slice());
                1 + 32
            }
        }
    }

    fn from_compact(mut buf: &[u8], _len: usize) -> (Self, &[u8]) {
        match buf.get_u8() {
            TAG_HASH => {
                let hash = B256::from_slice(&buf[..32]);
                buf.advance(32);
                (Self::HeaderHash(hash), buf)
            }
            _ => (Self::Slot(buf.get_u64()), buf),
        }
    }
}

/// Table of verification cursors, keyed by the fixed cursor names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Cursors;

impl Table for Cursors {
    const NAME: &'static str = "meta";
    const DUPSORT: bool = false;

    type Key = CursorKey;
    type Value = CursorValue;
}
