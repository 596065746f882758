//! # Validator Protection Database (qc-18)
//!
//! Durable record of everything a validator has signed, used to refuse
//! slashable requests.
//!
//! ## Buckets
//!
//! | Bucket | Key | Value |
//! |--------|-----|-------|
//! | `attestation-history-v2` | public key | `EncodedHistory` bytes |
//! | `attestation-history` | public key | legacy record (bincode), plus the export marker |
//! | `highest-signed-source-epoch` | public key | u64 big-endian |
//! | `highest-signed-target-epoch` | public key | u64 big-endian |
//! | `proposal-history` | public key ++ slot (BE) | signing root |
//! | `lowest-signed-proposal` / `highest-signed-proposal` | public key | u64 big-endian |
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | History Layout | Every stored history is `8 + k * 40` bytes |
//! | 2 | Mark Monotonicity | High-water marks never decrease |
//! | 3 | Atomic Transactions | An `update` commits all of its writes or none |
//! | 4 | One-shot Migration | The export marker is written with the converted histories, never alone |
//! | 5 | Single Owner | An on-disk database is locked to one process |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - history codec, legacy records, buckets, errors
//! - `ports/` - inbound database API, outbound `KeyValueStore`
//! - `adapters/` - in-memory and RocksDB stores, bincode serializer, directory lock
//! - `store/` - `ValidatorDb` and its transactions
//!
//! ## Usage
//!
//! ```ignore
//! use qc_18_validator_db::{AttestationHistoryApi, MigrationApi, ValidatorDb};
//!
//! let db = ValidatorDb::in_memory();
//! db.migrate()?;
//! let histories = db.attestation_histories(&[pubkey])?;
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod store;

pub use adapters::{BincodeLegacySerializer, InMemoryKVStore};
#[cfg(feature = "rocksdb")]
pub use adapters::{RocksDbConfig, RocksDbStore};
pub use domain::{
    check_layout, proposal_key, Bucket, CodecError, DbError, DbResult, EncodedHistory,
    HistoryData, KVStoreError, LegacyAttestationHistory, ATTESTATION_EXPORTED_KEY, HEADER_SIZE,
    HISTORY_ENTRY_SIZE, MIGRATED_SIGNING_ROOT, SIGNING_ROOT_SIZE,
};
pub use ports::inbound::{
    AttestationHistoryApi, HighWaterMarkApi, MarkKind, MigrationApi, ProposalHistoryApi,
};
pub use ports::outbound::{BatchOperation, KeyValueStore, LegacyRecordSerializer, ScanResult};
pub use store::migration::convert_legacy;
pub use store::{ReadTx, Reader, ValidatorDb, WriteTx};
