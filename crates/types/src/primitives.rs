//! BLS byte-level primitives.
//!
//! The orchestrator never interprets these beyond equality checks and
//! hex round-trips; actual curve operations live behind the
//! `SignatureVerifier` seam in `orchestrator-core`.

use alloy_primitives::FixedBytes;

/// Size of a compressed BLS12-381 public key in bytes.
pub const BLS_PUBLIC_KEY_SIZE: usize = 48;

/// Size of a compressed BLS12-381 signature in bytes.
pub const BLS_SIGNATURE_SIZE: usize = 96;

/// A compressed BLS public key, hex-serialised on the wire.
pub type BlsPublicKeyBytes = FixedBytes<BLS_PUBLIC_KEY_SIZE>;

/// A compressed BLS signature, hex-serialised on the wire.
pub type BlsSignatureBytes = FixedBytes<BLS_SIGNATURE_SIZE>;
