//! Types delivered by the Pandora (execution) chain.
//!
//! Pandora headers carry their consensus slot and the proposer's BLS
//! signature inside `extra_data`: the RLP encoding of [`ExtraData`] followed
//! by the raw 96 signature bytes.

use crate::primitives::{BlsSignatureBytes, BLS_SIGNATURE_SIZE};
use alloy_consensus::Header;
use alloy_primitives::{B256, Bytes};
use alloy_rlp::{Decodable, RlpDecodable, RlpEncodable};
use serde::{Deserialize, Serialize};

/// Subscription filter for the pending-header stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingHeaderFilter {
    /// Resume point: hash of the last header the orchestrator verified.
    pub from_block_hash: B256,
}

/// Slot assignment encoded at the front of a Pandora header's `extra_data`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, RlpEncodable, RlpDecodable)]
pub struct ExtraData {
    /// Consensus slot the header was produced for.
    pub slot: u64,
    /// Proposer turn within the slot.
    pub turn: u64,
}

/// [`ExtraData`] plus the proposer signature appended after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtraDataWithSig {
    /// The decoded slot assignment.
    pub extra: ExtraData,
    /// BLS signature over the header's signing root.
    pub signature: BlsSignatureBytes,
}

/// Errors decoding a Pandora header's `extra_data`.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ExtraDataError {
    /// The field is shorter than a bare BLS signature.
    #[error("extra data too short: {0} bytes")]
    TooShort(usize),
    /// The prefix before the signature is not valid RLP.
    #[error("invalid extra data prefix: {0}")]
    Decode(#[from] alloy_rlp::Error),
}

impl ExtraDataWithSig {
    /// Splits `extra_data` into the RLP-encoded [`ExtraData`] and the
    /// trailing signature bytes.
    pub fn decode(extra_data: &[u8]) -> Result<Self, ExtraDataError> {
        if extra_data.len() <= BLS_SIGNATURE_SIZE {
            return Err(ExtraDataError::TooShort(extra_data.len()));
        }
        let (prefix, sig) = extra_data.split_at(extra_data.len() - BLS_SIGNATURE_SIZE);
        let extra = ExtraData::decode(&mut &prefix[..])?;
        Ok(Self { extra, signature: BlsSignatureBytes::from_slice(sig) })
    }

    /// Encodes back into the on-header byte layout. Inverse of [`Self::decode`].
    pub fn to_bytes(&self) -> Bytes {
        let mut out = alloy_rlp::encode(self.extra);
        out.extend_from_slice(self.signature.as_slice());
        out.into()
    }
}

/// The message the proposer signed: hash of the header with the signature
/// stripped from `extra_data`.
pub fn signing_root(header: &Header) -> Result<B256, ExtraDataError> {
    if header.extra_data.len() <= BLS_SIGNATURE_SIZE {
        return Err(ExtraDataError::TooShort(header.extra_data.len()));
    }
    let mut unsigned = header.clone();
    let cut = header.extra_data.len() - BLS_SIGNATURE_SIZE;
    unsigned.extra_data = Bytes::copy_from_slice(&header.extra_data[..cut]);
    Ok(unsigned.hash_slow())
}

/// A pending Pandora header stamped with the fields extracted from its
/// `extra_data`. This is what the header cache holds and the pending-header
/// feed emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingHeader {
    /// The header as received from the node.
    pub header: Header,
    /// Consensus slot from `extra_data`.
    pub slot: u64,
    /// Hash of the full (signed) header.
    pub hash: B256,
    /// Proposer signature from `extra_data`.
    pub signature: BlsSignatureBytes,
}

impl PendingHeader {
    /// Stamps a raw header, decoding its `extra_data`.
    pub fn from_header(header: Header) -> Result<Self, ExtraDataError> {
        let decoded = ExtraDataWithSig::decode(&header.extra_data)?;
        let hash = header.hash_slow();
        Ok(Self { header, slot: decoded.extra.slot, hash, signature: decoded.signature })
    }

    /// The message the verifier checks the BLS signature against.
    pub fn signing_root(&self) -> Result<B256, ExtraDataError> {
        signing_root(&self.header)
    }
}
