//! Slot verdicts produced by the verifier.

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

/// The orchestrator's opinion on one (slot, execution-header) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictStatus {
    /// Not yet cross-checked against both chains.
    #[default]
    Pending,
    /// Both chains agree and the proposer signature checks out.
    Verified,
    /// The chains disagree, or the signature check failed.
    Invalid,
    /// No consensus block ever arrived for the slot.
    Skipped,
}

impl VerdictStatus {
    /// Verified and Invalid verdicts are final; Pending may be overwritten
    /// and Skipped rows may be superseded by a late terminal verdict.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Verified | Self::Invalid)
    }
}

impl core::fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Invalid => "invalid",
            Self::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// Durable per-slot verdict row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotVerdict {
    /// The consensus slot this verdict is about.
    pub slot: u64,
    /// Hash of the Pandora header the verdict refers to; zero for skipped
    /// slots.
    pub header_hash: B256,
    /// Outcome of the cross-check.
    pub status: VerdictStatus,
}

impl SlotVerdict {
    /// Convenience constructor.
    pub const fn new(slot: u64, header_hash: B256, status: VerdictStatus) -> Self {
        Self { slot, header_hash, status }
    }

    /// A skipped-slot fill-in row.
    pub const fn skipped(slot: u64) -> Self {
        Self { slot, header_hash: B256::ZERO, status: VerdictStatus::Skipped }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_json_is_lowercase() {
        assert_eq!(serde_json::to_string(&VerdictStatus::Verified).unwrap(), "\"verified\"");
        assert_eq!(
            serde_json::from_str::<VerdictStatus>("\"skipped\"").unwrap(),
            VerdictStatus::Skipped
        );
    }

    #[test]
    fn terminality() {
        assert!(VerdictStatus::Verified.is_terminal());
        assert!(VerdictStatus::Invalid.is_terminal());
        assert!(!VerdictStatus::Pending.is_terminal());
        assert!(!VerdictStatus::Skipped.is_terminal());
    }
}
