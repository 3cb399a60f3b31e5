//! Cross-chain slot verifier.
//!
//! Consumes pending headers from Pandora and shard infos from Vanguard,
//! matches them by slot, checks the identity fields and the proposer's BLS
//! signature, and persists a terminal verdict. Which side arrives first does
//! not matter: each arrival looks up the counterpart in the opposite cache
//! and whoever finds it performs the match.

use crate::{bls::SignatureVerifier, cache::SlotCache, error::VerifierError, event::Feed};
use orchestrator_storage::{EpochStorageReader, VerdictStorageReader, VerdictStorageWriter};
use orchestrator_types::{
    epoch_for_slot, EpochInfo, PendingHeader, ShardInfo, SlotVerdict, VerdictStatus,
};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// How a match attempt resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchOutcome {
    /// All identity fields and the proposer signature check out.
    Verified,
    /// The two sides disagree, or the signature is bad.
    Invalid(&'static str),
    /// The covering epoch schedule has not arrived yet; retry later.
    Deferred,
}

/// Matches pending headers against shard infos slot by slot.
#[derive(Debug)]
pub struct Verifier<DB, S> {
    db: Arc<DB>,
    signature_verifier: S,
    pan_cache: Arc<SlotCache<PendingHeader>>,
    van_cache: Arc<SlotCache<ShardInfo>>,
    verdict_feed: Feed<SlotVerdict>,
    // One lock per in-flight slot so concurrent arrivals of the same slot
    // from both feeds run exactly one match attempt.
    slot_locks: Mutex<HashMap<u64, Arc<Mutex<()>>>>,
}

impl<DB, S> Verifier<DB, S>
where
    DB: EpochStorageReader + VerdictStorageReader + VerdictStorageWriter + 'static,
    S: SignatureVerifier,
{
    /// Creates a new verifier over the two caches and the verdict feed.
    pub fn new(
        db: Arc<DB>,
        signature_verifier: S,
        pan_cache: Arc<SlotCache<PendingHeader>>,
        van_cache: Arc<SlotCache<ShardInfo>>,
        verdict_feed: Feed<SlotVerdict>,
    ) -> Self {
        Self {
            db,
            signature_verifier,
            pan_cache,
            van_cache,
            verdict_feed,
            slot_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Handles a pending Pandora header: matches it against a cached shard
    /// info for the same slot, if one already arrived.
    pub async fn on_pan_header(&self, header: &PendingHeader) {
        let lock = self.lock_slot(header.slot).await;
        {
            let _guard = lock.lock().await;
            match self.van_cache.get(header.slot) {
                Ok(shard) => self.attempt(header, &shard).await,
                Err(_) => {
                    debug!(
                        target: "orchestrator::verifier",
                        slot = header.slot,
                        "No Vanguard counterpart yet, waiting"
                    );
                }
            }
        }
        drop(lock);
        self.release_slot(header.slot).await;
    }

    /// Handles a pending Vanguard shard info, the mirror image of
    /// [`Self::on_pan_header`].
    pub async fn on_van_shard(&self, shard: &ShardInfo) {
        let lock = self.lock_slot(shard.slot).await;
        {
            let _guard = lock.lock().await;
            match self.pan_cache.get(shard.slot) {
                Ok(header) => self.attempt(&header, shard).await,
                Err(_) => {
                    debug!(
                        target: "orchestrator::verifier",
                        slot = shard.slot,
                        "No Pandora counterpart yet, waiting"
                    );
                }
            }
        }
        drop(lock);
        self.release_slot(shard.slot).await;
    }

    /// Re-drives every cached shard whose slot the newly arrived epoch
    /// schedule covers. This is how matches deferred on a missing epoch get
    /// retried without a separate waiter queue.
    pub async fn on_consensus_info(&self, info: &EpochInfo) {
        for (slot, shard) in self.van_cache.get_all() {
            if epoch_for_slot(slot) == info.epoch {
                self.on_van_shard(&shard).await;
            }
        }
    }

    async fn attempt(&self, header: &PendingHeader, shard: &ShardInfo) {
        let outcome = match self.evaluate(header, shard) {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(
                    target: "orchestrator::verifier",
                    slot = header.slot,
                    %err,
                    "Match attempt failed, keeping cache entries for retry"
                );
                return;
            }
        };

        let status = match outcome {
            MatchOutcome::Deferred => {
                debug!(
                    target: "orchestrator::verifier",
                    slot = header.slot,
                    epoch = epoch_for_slot(header.slot),
                    "Epoch schedule not known yet, deferring slot"
                );
                metrics::counter!("orchestrator_verifier_deferred_total").increment(1);
                return;
            }
            MatchOutcome::Verified => VerdictStatus::Verified,
            MatchOutcome::Invalid(reason) => {
                warn!(
                    target: "orchestrator::verifier",
                    slot = header.slot,
                    hash = %header.hash,
                    reason,
                    "Slot failed verification"
                );
                VerdictStatus::Invalid
            }
        };

        let verdict = SlotVerdict::new(header.slot, header.hash, status);
        if let Err(err) = self.db.save_slot_verdict(&verdict) {
            // Cache entries stay put so a later arrival retries the write.
            error!(
                target: "orchestrator::verifier",
                slot = verdict.slot,
                %err,
                "Failed to persist slot verdict"
            );
            return;
        }

        self.pan_cache.remove(verdict.slot);
        self.van_cache.remove(verdict.slot);
        let delivered = self.verdict_feed.send(verdict);
        metrics::counter!("orchestrator_verifier_verdicts_total", "status" => status.to_string())
            .increment(1);
        info!(
            target: "orchestrator::verifier",
            slot = verdict.slot,
            hash = %verdict.header_hash,
            status = %verdict.status,
            delivered,
            "Slot verdict written"
        );
    }

    fn evaluate(
        &self,
        header: &PendingHeader,
        shard: &ShardInfo,
    ) -> Result<MatchOutcome, VerifierError> {
        if header.header.number != shard.block_number {
            return Ok(MatchOutcome::Invalid("block number mismatch"));
        }
        if header.header.parent_hash != shard.parent_hash {
            return Ok(MatchOutcome::Invalid("parent hash mismatch"));
        }
        if header.header.state_root != shard.state_root {
            return Ok(MatchOutcome::Invalid("state root mismatch"));
        }
        if header.header.receipts_root != shard.receipt_hash {
            return Ok(MatchOutcome::Invalid("receipt hash mismatch"));
        }
        if header.header.transactions_root != shard.tx_hash {
            return Ok(MatchOutcome::Invalid("tx hash mismatch"));
        }

        let epoch = epoch_for_slot(header.slot);
        let Some(info) = self.db.epoch_info(epoch)? else {
            return Ok(MatchOutcome::Deferred);
        };
        let Some(proposer) = info.proposer(header.slot) else {
            return Ok(MatchOutcome::Invalid("empty validator schedule"));
        };

        if header.signature != shard.signature {
            return Ok(MatchOutcome::Invalid("signature bytes differ between chains"));
        }
        let Ok(signing_root) = header.signing_root() else {
            return Ok(MatchOutcome::Invalid("malformed extra data"));
        };
        if !self.signature_verifier.verify(proposer, signing_root, &header.signature) {
            return Ok(MatchOutcome::Invalid("bls signature verification failed"));
        }

        Ok(MatchOutcome::Verified)
    }

    async fn lock_slot(&self, slot: u64) -> Arc<Mutex<()>> {
        let mut locks = self.slot_locks.lock().await;
        locks.entry(slot).or_default().clone()
    }

    async fn release_slot(&self, slot: u64) {
        let mut locks = self.slot_locks.lock().await;
        if let Some(lock) = locks.get(&slot) {
            // Drop the map entry once nobody else holds a clone.
            if Arc::strong_count(lock) == 1 {
                locks.remove(&slot);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bls::{BlstVerifier, BLS_DST};
    use alloy_consensus::Header;
    use alloy_primitives::{b256, B256};
    use blst::min_pk::SecretKey;
    use mockall::mock;
    use orchestrator_storage::{EpochStorageWriter, OrchestratorDb, StorageError};
    use rand::RngCore;
    use orchestrator_types::{
        BlsPublicKeyBytes, BlsSignatureBytes, ExtraData, ExtraDataWithSig, SLOTS_PER_EPOCH,
    };
    use tempfile::TempDir;

    struct Fixture {
        verifier: Verifier<OrchestratorDb, BlstVerifier>,
        db: Arc<OrchestratorDb>,
        pan_cache: Arc<SlotCache<PendingHeader>>,
        van_cache: Arc<SlotCache<ShardInfo>>,
        secret_key: SecretKey,
        public_key: BlsPublicKeyBytes,
        _dir: TempDir,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let db = Arc::new(OrchestratorDb::new(dir.path()).unwrap());
        let pan_cache = Arc::new(SlotCache::default());
        let van_cache = Arc::new(SlotCache::default());
        let mut ikm = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut ikm);
        let secret_key = SecretKey::key_gen(&ikm, &[]).unwrap();
        let public_key = BlsPublicKeyBytes::from_slice(&secret_key.sk_to_pk().to_bytes());
        let verifier = Verifier::new(
            db.clone(),
            BlstVerifier,
            pan_cache.clone(),
            van_cache.clone(),
            Feed::default(),
        );
        Fixture { verifier, db, pan_cache, van_cache, secret_key, public_key, _dir: dir }
    }

    impl Fixture {
        fn save_epoch(&self, epoch: u64) {
            self.db
                .save_epoch_info(&EpochInfo {
                    epoch,
                    validator_list: vec![self.public_key],
                    epoch_start_time: 1_000,
                    slot_time_duration: 6,
                })
                .unwrap();
        }

        /// Builds a correctly signed header and its matching shard info.
        fn matched_pair(&self, slot: u64) -> (PendingHeader, ShardInfo) {
            let extra = ExtraData { slot, turn: 0 };
            let mut header = Header {
                number: 42 + slot,
                state_root: B256::repeat_byte(0x11),
                receipts_root: B256::repeat_byte(0x22),
                transactions_root: B256::repeat_byte(0x33),
                parent_hash: B256::repeat_byte(0x44),
                extra_data: ExtraDataWithSig { extra, signature: BlsSignatureBytes::ZERO }
                    .to_bytes(),
                ..Default::default()
            };
            let signing_root = orchestrator_types::signing_root(&header).unwrap();
            let signature = BlsSignatureBytes::from_slice(
                &self.secret_key.sign(signing_root.as_slice(), BLS_DST, &[]).to_bytes(),
            );
            header.extra_data = ExtraDataWithSig { extra, signature }.to_bytes();

            let pending = PendingHeader::from_header(header.clone()).unwrap();
            let shard = ShardInfo {
                slot,
                block_number: header.number,
                parent_hash: header.parent_hash,
                state_root: header.state_root,
                receipt_hash: header.receipts_root,
                tx_hash: header.transactions_root,
                signature,
                block_root: B256::repeat_byte(0x55),
            };
            (pending, shard)
        }
    }

    #[tokio::test]
    async fn happy_path_verifies_the_slot() {
        let fx = fixture();
        fx.save_epoch(0);
        let (pending, shard) = fx.matched_pair(1);
        let mut verdict_rx = fx.verifier.verdict_feed.subscribe();

        // Header first: no counterpart yet, nothing happens.
        fx.pan_cache.put(pending.slot, pending.clone());
        fx.verifier.on_pan_header(&pending).await;
        assert_eq!(fx.db.latest_verified_slot(), 0);

        // Shard arrives and completes the match.
        fx.van_cache.put(shard.slot, shard.clone());
        fx.verifier.on_van_shard(&shard).await;

        let verdict = fx.db.slot_verdict(1).unwrap().unwrap();
        assert_eq!(verdict.status, VerdictStatus::Verified);
        assert_eq!(verdict.header_hash, pending.hash);
        assert_eq!(fx.db.latest_verified_slot(), 1);
        assert_eq!(verdict_rx.try_recv().unwrap(), verdict);
        assert!(fx.pan_cache.is_empty());
        assert!(fx.van_cache.is_empty());
    }

    #[tokio::test]
    async fn state_root_mismatch_is_invalid() {
        let fx = fixture();
        fx.save_epoch(0);
        let (pending, mut shard) = fx.matched_pair(1);
        shard.state_root =
            b256!("dead000000000000000000000000000000000000000000000000000000000000");

        fx.pan_cache.put(pending.slot, pending.clone());
        fx.van_cache.put(shard.slot, shard.clone());
        fx.verifier.on_van_shard(&shard).await;

        assert_eq!(fx.db.slot_verdict(1).unwrap().unwrap().status, VerdictStatus::Invalid);
        assert!(fx.pan_cache.is_empty());
        assert!(fx.van_cache.is_empty());
    }

    #[tokio::test]
    async fn missing_epoch_defers_until_the_schedule_arrives() {
        let fx = fixture();
        let (pending, shard) = fx.matched_pair(7);

        fx.pan_cache.put(pending.slot, pending.clone());
        fx.van_cache.put(shard.slot, shard.clone());
        fx.verifier.on_van_shard(&shard).await;

        // Deferred: nothing written, both entries retained.
        assert_eq!(fx.db.slot_verdict(7).unwrap(), None);
        assert_eq!(fx.pan_cache.len(), 1);
        assert_eq!(fx.van_cache.len(), 1);

        // The schedule arrives and re-drives the slot.
        fx.save_epoch(0);
        let info = fx.db.epoch_info(0).unwrap().unwrap();
        fx.verifier.on_consensus_info(&info).await;

        assert_eq!(fx.db.slot_verdict(7).unwrap().unwrap().status, VerdictStatus::Verified);
        assert!(fx.van_cache.is_empty());
    }

    #[tokio::test]
    async fn bad_signature_is_invalid() {
        let fx = fixture();
        fx.save_epoch(0);
        let (mut pending, mut shard) = fx.matched_pair(2);

        // Re-sign with garbage on both sides so the bytes still agree.
        let garbage = BlsSignatureBytes::repeat_byte(0x99);
        pending.signature = garbage;
        pending.header.extra_data = ExtraDataWithSig {
            extra: ExtraData { slot: 2, turn: 0 },
            signature: garbage,
        }
        .to_bytes();
        pending.hash = pending.header.hash_slow();
        shard.signature = garbage;

        fx.pan_cache.put(pending.slot, pending.clone());
        fx.van_cache.put(shard.slot, shard.clone());
        fx.verifier.on_pan_header(&pending).await;

        assert_eq!(fx.db.slot_verdict(2).unwrap().unwrap().status, VerdictStatus::Invalid);
    }

    #[tokio::test]
    async fn signature_bytes_differing_between_chains_is_invalid() {
        let fx = fixture();
        fx.save_epoch(0);
        let (pending, mut shard) = fx.matched_pair(3);
        shard.signature = BlsSignatureBytes::repeat_byte(0x01);

        fx.pan_cache.put(pending.slot, pending.clone());
        fx.van_cache.put(shard.slot, shard.clone());
        fx.verifier.on_van_shard(&shard).await;

        assert_eq!(fx.db.slot_verdict(3).unwrap().unwrap().status, VerdictStatus::Invalid);
    }

    mock!(
        #[derive(Debug)]
        pub Db {}

        impl EpochStorageReader for Db {
            fn epoch_info(&self, epoch: u64) -> Result<Option<EpochInfo>, StorageError>;
            fn epoch_range(&self, from_epoch: u64) -> Result<Vec<EpochInfo>, StorageError>;
            fn latest_epoch(&self) -> Result<u64, StorageError>;
        }

        impl VerdictStorageReader for Db {
            fn slot_verdict(&self, slot: u64) -> Result<Option<SlotVerdict>, StorageError>;
            fn slot_range(
                &self,
                from_slot: u64,
            ) -> Result<std::collections::BTreeMap<u64, SlotVerdict>, StorageError>;
            fn first_verified_slot_in_epoch(
                &self,
                epoch: u64,
            ) -> Result<Option<SlotVerdict>, StorageError>;
            fn latest_verified_slot(&self) -> u64;
            fn latest_header_hash(&self) -> B256;
        }

        impl VerdictStorageWriter for Db {
            fn save_slot_verdict(&self, verdict: &SlotVerdict) -> Result<(), StorageError>;
        }
    );

    #[tokio::test]
    async fn store_failure_keeps_cache_entries_for_retry() {
        let mut db = MockDb::new();
        // A field mismatch resolves to Invalid without consulting the epoch
        // schedule, so only the failing write needs an expectation.
        db.expect_save_slot_verdict()
            .returning(|_| Err(StorageError::DatabaseInit("disk gone".to_string())));

        let pan_cache = Arc::new(SlotCache::default());
        let van_cache = Arc::new(SlotCache::default());
        let verifier = Verifier::new(
            Arc::new(db),
            BlstVerifier,
            pan_cache.clone(),
            van_cache.clone(),
            Feed::default(),
        );

        let fx = fixture();
        let (pending, mut shard) = fx.matched_pair(1);
        shard.block_number += 1;

        pan_cache.put(pending.slot, pending.clone());
        van_cache.put(shard.slot, shard.clone());
        verifier.on_van_shard(&shard).await;

        // The write failed; both sides stay cached so a later arrival
        // retries the slot.
        assert_eq!(pan_cache.len(), 1);
        assert_eq!(van_cache.len(), 1);
    }

    #[tokio::test]
    async fn verifying_a_later_slot_fills_the_gap_with_skipped() {
        let fx = fixture();
        fx.save_epoch(0);
        fx.save_epoch(1);

        let (pending, shard) = fx.matched_pair(2);
        fx.pan_cache.put(pending.slot, pending.clone());
        fx.van_cache.put(shard.slot, shard.clone());
        fx.verifier.on_van_shard(&shard).await;

        let (pending, shard) = fx.matched_pair(SLOTS_PER_EPOCH + 1);
        fx.pan_cache.put(pending.slot, pending.clone());
        fx.van_cache.put(shard.slot, shard.clone());
        fx.verifier.on_van_shard(&shard).await;

        assert_eq!(fx.db.latest_verified_slot(), SLOTS_PER_EPOCH + 1);
        for slot in 3..SLOTS_PER_EPOCH + 1 {
            assert_eq!(
                fx.db.slot_verdict(slot).unwrap().unwrap().status,
                VerdictStatus::Skipped,
            );
        }
    }
}
