//! # Migration and Restart
//!
//! Legacy history migrated on a real RocksDB, with the database closed and
//! reopened between steps the way a validator restarts.

#[cfg(test)]
mod tests {
    use qc_18_validator_db::{
        AttestationHistoryApi, DbError, EncodedHistory, HighWaterMarkApi, HistoryData,
        LegacyAttestationHistory, MarkKind, MigrationApi, RocksDbConfig, ValidatorDb,
        HEADER_SIZE, HISTORY_ENTRY_SIZE, MIGRATED_SIGNING_ROOT,
    };
    use shared_types::{PublicKey, WEAK_SUBJECTIVITY_PERIOD};
    use std::path::Path;
    use tempfile::TempDir;

    fn open(dir: &Path) -> ValidatorDb<qc_18_validator_db::RocksDbStore> {
        ValidatorDb::open(RocksDbConfig::for_testing(dir)).unwrap()
    }

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
    fn test_migration_runs_once_across_restarts() {
        crate::init_test_logging();
        let dir = TempDir::new().unwrap();

        {
            let db = open(dir.path());
            db.save_legacy_attestation_history(&pubkey(1), &legacy(&[(1, 0), (2, 1), (5, 4)]))
                .unwrap();
            db.save_legacy_attestation_history(&pubkey(2), &legacy(&[(7, 6)]))
                .unwrap();
        }

        let migrated = {
            let db = open(dir.path());
            assert!(db.should_migrate().unwrap());
            db.migrate().unwrap();
            db.attestation_histories(&[pubkey(1), pubkey(2)]).unwrap()
        };

        let db = open(dir.path());
        assert!(!db.should_migrate().unwrap());
        db.migrate().unwrap();
        let reread = db.attestation_histories(&[pubkey(1), pubkey(2)]).unwrap();
        assert_eq!(migrated, reread);

        let first = &reread[&pubkey(1)];
        assert_eq!(first.latest_epoch_written(), 5);
        assert_eq!(
            first.attested_target(2),
            Some(HistoryData::new(1, MIGRATED_SIGNING_ROOT))
        );
        assert_eq!(first.attested_target(3), None);
        assert_eq!(
            db.attested_public_keys().unwrap().into_iter().collect::<Vec<_>>(),
            vec![pubkey(1), pubkey(2)]
        );

        // The legacy records stay readable after migration.
        let records = db.attestation_history_for_pubkeys(&[pubkey(2)]).unwrap();
        assert_eq!(records[&pubkey(2)], legacy(&[(7, 6)]));
    }

    #[test]
    fn test_wraparound_history_persists() {
        let dir = TempDir::new().unwrap();
        let key = pubkey(3);

        let mut history = EncodedHistory::new(0);
        history.mark_attested_since_latest_written(0, &HistoryData::new(1, [0x01; 32]));
        history.mark_attested_since_latest_written(
            WEAK_SUBJECTIVITY_PERIOD,
            &HistoryData::new(2, [0x02; 32]),
        );

        {
            let db = open(dir.path());
            db.save_attestation_history(&key, &history).unwrap();
        }

        let db = open(dir.path());
        let stored = db.attestation_histories(&[key]).unwrap().remove(&key).unwrap();
        assert_eq!(stored, history);
        assert_eq!(stored.latest_epoch_written(), WEAK_SUBJECTIVITY_PERIOD);
        assert_eq!(
            stored.len(),
            HEADER_SIZE + WEAK_SUBJECTIVITY_PERIOD as usize * HISTORY_ENTRY_SIZE
        );
        assert_eq!(stored.target_data(0), Some(HistoryData::new(2, [0x02; 32])));
        assert_eq!(stored.attested_target(1), None);
    }

    #[test]
    fn test_marks_persist_and_never_regress() {
        let dir = TempDir::new().unwrap();
        let key = pubkey(4);

        {
            let db = open(dir.path());
            db.save_highest_signed_epoch(MarkKind::Source, &key, 9).unwrap();
            db.save_highest_signed_epoch(MarkKind::Target, &key, 10).unwrap();
        }

        let db = open(dir.path());
        assert!(!db.save_highest_signed_epoch(MarkKind::Target, &key, 3).unwrap());
        assert_eq!(db.highest_signed_epoch(MarkKind::Source, &key).unwrap(), 9);
        assert_eq!(db.highest_signed_epoch(MarkKind::Target, &key).unwrap(), 10);
    }

    #[test]
    fn test_second_process_is_locked_out() {
        let dir = TempDir::new().unwrap();
        let _db = open(dir.path());

        let second = ValidatorDb::open(RocksDbConfig::for_testing(dir.path()));
        assert!(matches!(second, Err(DbError::Lock { .. })));
    }
}
