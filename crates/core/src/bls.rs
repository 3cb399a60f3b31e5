//! BLS signature verification seam.
//!
//! The verifier treats signature checking as opaque; this module provides
//! the trait boundary plus the production `blst` implementation.

use alloy_primitives::B256;
use blst::{
    min_pk::{PublicKey, Signature},
    BLST_ERROR,
};
use orchestrator_types::{BlsPublicKeyBytes, BlsSignatureBytes};
use std::fmt::Debug;

/// Domain separation tag for proposer signatures (Ethereum 2.0 compatible).
pub const BLS_DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

/// Verifies a proposer signature over a 32-byte signing root.
pub trait SignatureVerifier: Send + Sync + Debug {
    /// Returns `true` iff `signature` is a valid signature of `message` by
    /// `public_key`. Malformed keys or signatures verify as `false`.
    fn verify(
        &self,
        public_key: &BlsPublicKeyBytes,
        message: B256,
        signature: &BlsSignatureBytes,
    ) -> bool;
}

/// [`SignatureVerifier`] backed by `blst` (min-pk, Ethereum DST).
#[derive(Debug, Clone, Copy, Default)]
pub struct BlstVerifier;

impl SignatureVerifier for BlstVerifier {
    fn verify(
        &self,
        public_key: &BlsPublicKeyBytes,
        message: B256,
        signature: &BlsSignatureBytes,
    ) -> bool {
        let Ok(public_key) = PublicKey::from_bytes(public_key.as_slice()) else {
            return false;
        };
        let Ok(signature) = Signature::from_bytes(signature.as_slice()) else {
            return false;
        };
        signature.verify(true, message.as_slice(), BLS_DST, &[], &public_key, true)
            == BLST_ERROR::BLST_SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blst::min_pk::SecretKey;
    use rand::RngCore;

    fn keypair() -> (SecretKey, BlsPublicKeyBytes) {
        let mut ikm = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut ikm);
        let sk = SecretKey::key_gen(&ikm, &[]).unwrap();
        let pk = BlsPublicKeyBytes::from_slice(&sk.sk_to_pk().to_bytes());
        (sk, pk)
    }

    #[test]
    fn valid_signature_verifies() {
        let (sk, pk) = keypair();
        let message = B256::repeat_byte(0x42);
        let sig = sk.sign(message.as_slice(), BLS_DST, &[]);
        let sig = BlsSignatureBytes::from_slice(&sig.to_bytes());
        assert!(BlstVerifier.verify(&pk, message, &sig));
    }

    #[test]
    fn wrong_key_or_message_fails() {
        let (sk, pk) = keypair();
        let (_, other_pk) = keypair();
        let message = B256::repeat_byte(0x42);
        let sig = sk.sign(message.as_slice(), BLS_DST, &[]);
        let sig = BlsSignatureBytes::from_slice(&sig.to_bytes());

        assert!(!BlstVerifier.verify(&other_pk, message, &sig));
        assert!(!BlstVerifier.verify(&pk, B256::repeat_byte(0x43), &sig));
    }

    #[test]
    fn garbage_bytes_fail_closed() {
        let message = B256::ZERO;
        assert!(!BlstVerifier.verify(
            &BlsPublicKeyBytes::repeat_byte(0xff),
            message,
            &BlsSignatureBytes::repeat_byte(0xff)
        ));
    }
}
