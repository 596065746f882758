//! # Signing Flows
//!
//! The protection service driving a RocksDB-backed validator database:
//! restarts, migrated history and many validators signing at once.

#[cfg(test)]
mod tests {
    use qc_18_validator_db::{
        HighWaterMarkApi, LegacyAttestationHistory, MarkKind, MigrationApi, RocksDbConfig,
        RocksDbStore, ValidatorDb,
    };
    use qc_19_slashing_protection::{Protector, ProtectionService, SlashingKind};
    use shared_types::{
        AttestationData, BeaconBlockHeader, Checkpoint, DomainResponse, Epoch, IndexedAttestation,
        PublicKey, SignedBeaconBlock, Slot,
    };
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    type Service = ProtectionService<ValidatorDb<RocksDbStore>>;

    fn service_at(dir: &Path) -> Service {
        let db = ValidatorDb::open(RocksDbConfig::for_testing(dir)).unwrap();
        db.migrate().unwrap();
        let service = ProtectionService::local_only(Arc::new(db));
        service.start();
        service
    }

    fn domain() -> DomainResponse {
        DomainResponse {
            signature_domain: [9; 32],
        }
    }

    fn attestation(source: Epoch, target: Epoch, head: u8) -> IndexedAttestation {
        IndexedAttestation {
            attesting_indices: vec![7],
            data: AttestationData {
                slot: target * 32,
                committee_index: 1,
                beacon_block_root: [head; 32],
                source: Checkpoint {
                    epoch: source,
                    root: [0; 32],
                },
                target: Checkpoint {
                    epoch: target,
                    root: [head; 32],
                },
            },
            signature: vec![],
        }
    }

    fn block(slot: Slot, body: u8) -> SignedBeaconBlock {
        SignedBeaconBlock {
            header: BeaconBlockHeader {
                slot,
                proposer_index: 7,
                body_root: [body; 32],
                ..Default::default()
            },
            signature: vec![],
        }
    }

    #[tokio::test]
    async fn test_protection_survives_process_restart() {
        crate::init_test_logging();
        let dir = TempDir::new().unwrap();
        let key = PublicKey([0x42; 48]);

        {
            let service = service_at(dir.path());
            service
                .is_slashable_attestation(&attestation(10, 11, 1), key, &domain())
                .await
                .unwrap();
            service
                .is_slashable_block(&block(352, 1), key, &domain())
                .await
                .unwrap();
            service.stop().unwrap();
        }

        let service = service_at(dir.path());
        let double_vote = service
            .is_slashable_attestation(&attestation(10, 11, 2), key, &domain())
            .await
            .unwrap_err();
        assert_eq!(double_vote.slashing_kind(), Some(SlashingKind::DoubleVote));

        let double_proposal = service
            .is_slashable_block(&block(352, 2), key, &domain())
            .await
            .unwrap_err();
        assert_eq!(
            double_proposal.slashing_kind(),
            Some(SlashingKind::DoubleProposal)
        );

        // Exact repeats stay signable.
        service
            .is_slashable_attestation(&attestation(10, 11, 1), key, &domain())
            .await
            .unwrap();
        service
            .is_slashable_block(&block(352, 1), key, &domain())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_migrated_history_protects() {
        let dir = TempDir::new().unwrap();
        let key = PublicKey([0x07; 48]);

        {
            let db = ValidatorDb::open(RocksDbConfig::for_testing(dir.path())).unwrap();
            let mut record = LegacyAttestationHistory::new(0);
            record.insert(6, 5);
            db.save_legacy_attestation_history(&key, &record).unwrap();
        }

        let service = service_at(dir.path());

        // Legacy votes kept no root, so even the "same" vote is refused.
        let repeat = service
            .is_slashable_attestation(&attestation(5, 6, 1), key, &domain())
            .await
            .unwrap_err();
        assert_eq!(repeat.slashing_kind(), Some(SlashingKind::DoubleVote));

        let surrounding = service
            .is_slashable_attestation(&attestation(4, 7, 1), key, &domain())
            .await
            .unwrap_err();
        assert_eq!(
            surrounding.slashing_kind(),
            Some(SlashingKind::SurroundingVote)
        );

        service
            .is_slashable_attestation(&attestation(6, 7, 1), key, &domain())
            .await
            .unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_many_validators_sign_concurrently() {
        let dir = TempDir::new().unwrap();
        let service = Arc::new(service_at(dir.path()));

        let tasks: Vec<_> = (0u8..16)
            .map(|i| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    let key = PublicKey([i; 48]);
                    for target in 1..=10 {
                        service
                            .is_slashable_attestation(&attestation(target - 1, target, i), key, &domain())
                            .await?;
                    }
                    Ok::<_, qc_19_slashing_protection::ProtectionError>(key)
                })
            })
            .collect();

        for task in tasks {
            let key = task.await.unwrap().unwrap();
            let db = service.db();
            assert_eq!(db.highest_signed_epoch(MarkKind::Source, &key).unwrap(), 9);
            assert_eq!(db.highest_signed_epoch(MarkKind::Target, &key).unwrap(), 10);
        }
    }
}
