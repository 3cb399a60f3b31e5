//! Handlers for events arriving on the Vanguard subscriptions.

use super::service::VanguardService;
use orchestrator_storage::{EpochStorageWriter, VerdictStorageReader};
use orchestrator_types::{BeaconBlock, EpochInfo, ShardInfo};
use tracing::{error, trace, warn};

impl<DB> VanguardService<DB>
where
    DB: EpochStorageWriter + VerdictStorageReader + 'static,
{
    /// Persists a new epoch schedule and fans it out to subscribers.
    pub(crate) fn on_new_consensus_info(&self, info: &EpochInfo) {
        let delivered = self.feeds.consensus_info.send(info.clone());
        trace!(
            target: "orchestrator::vanguard",
            epoch = info.epoch,
            delivered,
            "Sent consensus info to subscribers"
        );

        if let Err(err) = self.db.save_epoch_info(info) {
            warn!(
                target: "orchestrator::vanguard",
                epoch = info.epoch,
                %err,
                "Failed to save consensus info"
            );
        }
    }

    /// Extracts the shard info from a pending beacon block and republishes
    /// it. Blocks below the verified cursor are rejected outright.
    pub(crate) fn on_new_pending_block(&self, block: &BeaconBlock) {
        let latest_verified_slot = self.db.latest_verified_slot();
        if block.slot < latest_verified_slot {
            error!(
                target: "orchestrator::vanguard",
                slot = block.slot,
                latest_verified_slot,
                "Reorgs not supported, dropping Vanguard block"
            );
            metrics::counter!("orchestrator_vanguard_reorgs_rejected_total").increment(1);
            return;
        }

        let Some(shard_info) = ShardInfo::from_block(block) else {
            error!(
                target: "orchestrator::vanguard",
                slot = block.slot,
                "Pandora sharding info not present, dropping Vanguard block"
            );
            return;
        };

        metrics::counter!("orchestrator_vanguard_blocks_total").increment(1);
        self.cache.put(shard_info.slot, shard_info.clone());
        let delivered = self.feeds.pending_van_shard.send(shard_info.clone());
        trace!(
            target: "orchestrator::vanguard",
            slot = shard_info.slot,
            block_root = %shard_info.block_root,
            delivered,
            "Cached and published pending Vanguard shard info"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cache::SlotCache, event::OrchestratorFeeds};
    use alloy_primitives::b256;
    use orchestrator_storage::{EpochStorageReader, OrchestratorDb, VerdictStorageWriter};
    use orchestrator_types::{
        BeaconBlockBody, BlsPublicKeyBytes, PandoraShard, SlotVerdict, VerdictStatus,
    };
    use std::{sync::Arc, time::Duration};
    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;

    fn service(dir: &TempDir) -> VanguardService<OrchestratorDb> {
        let db = Arc::new(OrchestratorDb::new(dir.path()).unwrap());
        VanguardService::new(
            "ws://127.0.0.1:0".to_string(),
            Duration::from_secs(1),
            db,
            Arc::new(SlotCache::default()),
            OrchestratorFeeds::default(),
            CancellationToken::new(),
        )
    }

    fn block_with_shard(slot: u64) -> BeaconBlock {
        BeaconBlock {
            slot,
            body: BeaconBlockBody {
                pandora_shard: vec![PandoraShard { block_number: slot, ..Default::default() }],
            },
        }
    }

    #[test]
    fn pending_block_is_cached_and_published() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir);
        let mut shard_rx = service.feeds.pending_van_shard.subscribe();

        let block = block_with_shard(7);
        service.on_new_pending_block(&block);

        let cached = service.cache.get(7).unwrap();
        assert_eq!(cached.block_root, block.block_root());
        assert_eq!(shard_rx.try_recv().unwrap(), cached);
    }

    #[test]
    fn block_below_the_cursor_is_rejected() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir);
        service
            .db
            .save_slot_verdict(&SlotVerdict::new(
                10,
                b256!("00000000000000000000000000000000000000000000000000000000000000aa"),
                VerdictStatus::Verified,
            ))
            .unwrap();

        service.on_new_pending_block(&block_with_shard(9));

        assert!(service.cache.is_empty());
        assert_eq!(service.db.latest_verified_slot(), 10);
    }

    #[test]
    fn block_without_shard_info_is_dropped() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir);

        service.on_new_pending_block(&BeaconBlock { slot: 3, body: BeaconBlockBody::default() });

        assert!(service.cache.is_empty());
    }

    #[test]
    fn consensus_info_is_saved_and_fanned_out() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir);
        let mut info_rx = service.feeds.consensus_info.subscribe();

        let info = EpochInfo {
            epoch: 5,
            validator_list: vec![BlsPublicKeyBytes::repeat_byte(1)],
            epoch_start_time: 1_700_000_000,
            slot_time_duration: 6,
        };
        service.on_new_consensus_info(&info);

        assert_eq!(info_rx.try_recv().unwrap(), info);
        assert_eq!(service.db.epoch_info(5).unwrap(), Some(info));
    }
}
