//! One-shot conversion of legacy sparse histories into encoded histories.
//!
//! Pending -> Done, persisted as the export marker in the legacy bucket.
//! Every converted history and the marker are written in one transaction,
//! so a failure leaves no marker and the next startup retries from scratch.

use super::attestations::write_history;
use super::{Reader, ValidatorDb};
use crate::domain::buckets::{Bucket, ATTESTATION_EXPORTED_KEY};
use crate::domain::errors::{DbError, DbResult};
use crate::domain::history::{EncodedHistory, HistoryData};
use crate::domain::legacy::{LegacyAttestationHistory, MIGRATED_SIGNING_ROOT};
use crate::ports::inbound::MigrationApi;
use crate::ports::outbound::{KeyValueStore, LegacyRecordSerializer};
use shared_types::{PublicKey, WEAK_SUBJECTIVITY_PERIOD};
use std::collections::HashMap;

/// Encoded equivalent of a legacy record.
///
/// Only targets inside the retained window `(latest - period, latest]` are
/// replayed. An older vote would otherwise sit in a slot shared with an
/// unsigned in-window target and read back as that target's vote.
/// The buffer is pre-sized with empty slots to cover every replayed target, so
/// slots between them never read back as zero-source votes.
/// Targets are replayed in ascending order so that when two share a slot the
/// newer one wins.
pub fn convert_legacy(legacy: &LegacyAttestationHistory) -> EncodedHistory {
    let latest = legacy.latest_epoch_written;
    let retained = || {
        legacy
            .target_to_source
            .iter()
            .filter(move |(&target, _)| target.saturating_add(WEAK_SUBJECTIVITY_PERIOD) > latest)
    };
    let widest = retained()
        .map(|(target, _)| target)
        .chain(std::iter::once(&latest))
        .map(|target| target % WEAK_SUBJECTIVITY_PERIOD)
        .max()
        .unwrap_or(0);
    let mut history = EncodedHistory::new(widest);
    for (&target, &source) in retained() {
        history.set_target_data(target, &HistoryData::new(source, MIGRATED_SIGNING_ROOT));
    }
    history.set_latest_epoch_written(legacy.latest_epoch_written);
    history
}

impl<KV: KeyValueStore, LS: LegacyRecordSerializer> ValidatorDb<KV, LS> {
    fn legacy_records<R: Reader>(
        &self,
        tx: &R,
    ) -> DbResult<Vec<(PublicKey, LegacyAttestationHistory)>> {
        tx.scan(Bucket::LEGACY_ATTESTATION_HISTORY)?
            .into_iter()
            .filter(|(key, _)| key.as_slice() != ATTESTATION_EXPORTED_KEY)
            .filter_map(|(key, value)| PublicKey::from_slice(&key).map(|pk| (pk, value)))
            .map(|(pubkey, value)| Ok((pubkey, self.legacy_serializer().deserialize(&value)?)))
            .collect()
    }
}

impl<KV: KeyValueStore, LS: LegacyRecordSerializer> MigrationApi for ValidatorDb<KV, LS> {
    fn attestation_history_for_pubkeys(
        &self,
        pubkeys: &[PublicKey],
    ) -> DbResult<HashMap<PublicKey, LegacyAttestationHistory>> {
        self.view(|tx| {
            let mut records = HashMap::with_capacity(pubkeys.len());
            for pubkey in pubkeys {
                let record = match tx.get(Bucket::LEGACY_ATTESTATION_HISTORY, pubkey.as_bytes())? {
                    Some(bytes) => self.legacy_serializer().deserialize(&bytes)?,
                    None => LegacyAttestationHistory::default(),
                };
                records.insert(*pubkey, record);
            }
            Ok(records)
        })
    }

    fn save_legacy_attestation_history(
        &self,
        pubkey: &PublicKey,
        record: &LegacyAttestationHistory,
    ) -> DbResult<()> {
        let bytes = self.legacy_serializer().serialize(record)?;
        self.update(|tx| {
            tx.put(Bucket::LEGACY_ATTESTATION_HISTORY, pubkey.as_bytes(), bytes);
            Ok(())
        })
    }

    fn should_migrate(&self) -> DbResult<bool> {
        self.view(|tx| {
            let entries = tx.scan(Bucket::LEGACY_ATTESTATION_HISTORY)?;
            let exported = entries
                .iter()
                .any(|(key, _)| key.as_slice() == ATTESTATION_EXPORTED_KEY);
            Ok(!entries.is_empty() && !exported)
        })
    }

    fn migrate(&self) -> DbResult<()> {
        if !self.should_migrate().map_err(DbError::migration)? {
            tracing::debug!("[qc-18] Attestation history already migrated");
            return Ok(());
        }

        tracing::info!("[qc-18] Migrating legacy attestation history");
        let migrated = self
            .update(|tx| {
                let records = self.legacy_records(&*tx)?;
                for (pubkey, legacy) in &records {
                    write_history(tx, pubkey, &convert_legacy(legacy));
                }
                tx.put(
                    Bucket::LEGACY_ATTESTATION_HISTORY,
                    ATTESTATION_EXPORTED_KEY,
                    vec![1u8],
                );
                Ok(records.len())
            })
            .map_err(|e| {
                tracing::error!(error = %e, "[qc-18] Attestation history migration failed");
                DbError::migration(e)
            })?;

        tracing::info!(keys = migrated, "[qc-18] Attestation history migration complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryKVStore;
    use crate::domain::errors::KVStoreError;
    use crate::ports::inbound::AttestationHistoryApi;
    use crate::ports::outbound::{BatchOperation, ScanResult};

    fn pubkey(byte: u8) -> PublicKey {
        PublicKey([byte; 48])
    }

    fn legacy(pairs: &[(u64, u64)]) -> LegacyAttestationHistory {
        let mut record = LegacyAttestationHistory::new(0);
        for &(target, source) in pairs {
            record.insert(target, source);
        }
        record
    }

    #[test]
    fn test_convert_legacy_uses_placeholder_root() {
        let history = convert_legacy(&legacy(&[(2, 1), (5, 3)]));

        assert_eq!(history.latest_epoch_written(), 5);
        assert_eq!(
            history.attested_target(5),
            Some(HistoryData::new(3, MIGRATED_SIGNING_ROOT))
        );
        assert_eq!(
            history.attested_target(2),
            Some(HistoryData::new(1, MIGRATED_SIGNING_ROOT))
        );
        assert_eq!(history.attested_target(3), None);
    }

    #[test]
    fn test_convert_legacy_newer_target_wins_shared_slot() {
        let history = convert_legacy(&legacy(&[(1, 0), (1 + WEAK_SUBJECTIVITY_PERIOD, 7)]));
        assert_eq!(
            history.target_data(1),
            Some(HistoryData::new(7, MIGRATED_SIGNING_ROOT))
        );
    }

    #[test]
    fn test_convert_legacy_drops_votes_outside_window() {
        let history = convert_legacy(&legacy(&[
            (5, 4),
            (WEAK_SUBJECTIVITY_PERIOD + 10, WEAK_SUBJECTIVITY_PERIOD + 9),
        ]));

        assert_eq!(history.latest_epoch_written(), WEAK_SUBJECTIVITY_PERIOD + 10);
        // Epoch 5 shares its slot with the unsigned in-window target PERIOD + 5.
        assert_eq!(history.attested_target(WEAK_SUBJECTIVITY_PERIOD + 5), None);
        assert_eq!(
            history.attested_target(WEAK_SUBJECTIVITY_PERIOD + 10),
            Some(HistoryData::new(WEAK_SUBJECTIVITY_PERIOD + 9, MIGRATED_SIGNING_ROOT))
        );
    }

    #[test]
    fn test_convert_legacy_keeps_gaps_empty() {
        // Target from the previous period lands beyond the latest slot.
        let latest = WEAK_SUBJECTIVITY_PERIOD + 2;
        let older = WEAK_SUBJECTIVITY_PERIOD - 1;
        let history = convert_legacy(&legacy(&[(older, older - 1), (latest, older)]));

        assert_eq!(history.latest_epoch_written(), latest);
        assert_eq!(
            history.attested_target(older),
            Some(HistoryData::new(older - 1, MIGRATED_SIGNING_ROOT))
        );
        for gap in [3, 100, older - 1] {
            assert_eq!(history.attested_target(gap), None, "gap slot {gap}");
        }
    }

    #[test]
    fn test_empty_legacy_bucket_needs_no_migration() {
        let db = ValidatorDb::in_memory();
        assert!(!db.should_migrate().unwrap());
        db.migrate().unwrap();
        assert!(db.attested_public_keys().unwrap().is_empty());
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let db = ValidatorDb::in_memory();
        db.save_legacy_attestation_history(&pubkey(1), &legacy(&[(3, 2), (4, 3)]))
            .unwrap();
        db.save_legacy_attestation_history(&pubkey(2), &legacy(&[(10, 0)]))
            .unwrap();
        assert!(db.should_migrate().unwrap());

        db.migrate().unwrap();
        assert!(!db.should_migrate().unwrap());
        let first = db.attestation_histories(&[pubkey(1), pubkey(2)]).unwrap();
        assert_eq!(first[&pubkey(1)].latest_epoch_written(), 4);
        assert_eq!(
            first[&pubkey(2)].attested_target(10),
            Some(HistoryData::new(0, MIGRATED_SIGNING_ROOT))
        );

        db.migrate().unwrap();
        let second = db.attestation_histories(&[pubkey(1), pubkey(2)]).unwrap();
        assert_eq!(first, second);

        // Legacy data is left in place.
        let records = db.attestation_history_for_pubkeys(&[pubkey(1)]).unwrap();
        assert_eq!(records[&pubkey(1)], legacy(&[(3, 2), (4, 3)]));
    }

    #[test]
    fn test_missing_legacy_record_reads_default() {
        let db = ValidatorDb::in_memory();
        let records = db.attestation_history_for_pubkeys(&[pubkey(9)]).unwrap();
        assert_eq!(records[&pubkey(9)], LegacyAttestationHistory::default());
    }

    #[test]
    fn test_corrupt_legacy_record_aborts_without_marker() {
        let db = ValidatorDb::in_memory();
        db.save_legacy_attestation_history(&pubkey(1), &legacy(&[(3, 2)]))
            .unwrap();
        db.update(|tx| {
            tx.put(Bucket::LEGACY_ATTESTATION_HISTORY, pubkey(2).as_bytes(), vec![0xFF]);
            Ok(())
        })
        .unwrap();

        assert!(matches!(db.migrate(), Err(DbError::Migration { .. })));
        assert!(db.should_migrate().unwrap());
        assert!(db.attested_public_keys().unwrap().is_empty());
    }

    /// Store whose batch commits fail on demand.
    #[derive(Default)]
    struct FailingCommitStore {
        inner: InMemoryKVStore,
        fail_commits: bool,
    }

    impl KeyValueStore for FailingCommitStore {
        fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
            self.inner.get(key)
        }

        fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
            if self.fail_commits {
                return Err(KVStoreError::IOError {
                    message: "disk full".into(),
                });
            }
            self.inner.atomic_batch_write(operations)
        }

        fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError> {
            self.inner.prefix_scan(prefix)
        }
    }

    #[test]
    fn test_storage_fault_leaves_migration_pending() {
        let db = ValidatorDb::new(FailingCommitStore::default());
        db.save_legacy_attestation_history(&pubkey(1), &legacy(&[(3, 2)]))
            .unwrap();
        db.kv.write().fail_commits = true;

        match db.migrate() {
            Err(DbError::Migration { source }) => {
                assert!(matches!(*source, DbError::Storage(_)));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(db.should_migrate().unwrap());

        db.kv.write().fail_commits = false;
        db.migrate().unwrap();
        assert!(!db.should_migrate().unwrap());
        assert_eq!(db.attested_public_keys().unwrap().len(), 1);
    }
}
