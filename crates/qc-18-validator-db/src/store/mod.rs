//! # Validator Database
//!
//! `ValidatorDb` owns a `KeyValueStore` and exposes it through two scoped
//! transactions:
//!
//! - [`ValidatorDb::view`]: read-only, consistent for the whole closure.
//! - [`ValidatorDb::update`]: read-write. Writes are buffered and visible to
//!   later reads in the same closure; they are committed as one atomic batch
//!   only when the closure returns `Ok`. An `Err` discards every buffered
//!   write, so callers never observe a partially written history.
//!
//! The inbound ports (`AttestationHistoryApi`, `HighWaterMarkApi`,
//! `ProposalHistoryApi`, `MigrationApi`) are implemented on top of these in
//! the sibling modules.

mod attestations;
mod marks;
pub mod migration;
mod proposals;

use crate::adapters::serializer::BincodeLegacySerializer;
use crate::adapters::storage::InMemoryKVStore;
use crate::domain::buckets::Bucket;
use crate::domain::errors::{DbError, DbResult};
use crate::ports::outbound::{BatchOperation, KeyValueStore, LegacyRecordSerializer};
use parking_lot::RwLock;
use shared_types::PublicKey;
use std::collections::{BTreeMap, BTreeSet};

#[cfg(feature = "rocksdb")]
use crate::adapters::storage::{RocksDbConfig, RocksDbStore};

/// Validator protection database.
pub struct ValidatorDb<KV: KeyValueStore, LS: LegacyRecordSerializer = BincodeLegacySerializer> {
    kv: RwLock<KV>,
    legacy_serializer: LS,
}

impl ValidatorDb<InMemoryKVStore> {
    /// Fresh, empty database held in memory.
    pub fn in_memory() -> Self {
        Self::new(InMemoryKVStore::new())
    }
}

#[cfg(feature = "rocksdb")]
impl ValidatorDb<RocksDbStore> {
    /// Open (or create) the on-disk database, taking the directory lock.
    pub fn open(config: RocksDbConfig) -> DbResult<Self> {
        Ok(Self::new(RocksDbStore::open(config)?))
    }
}

impl<KV: KeyValueStore> ValidatorDb<KV> {
    pub fn new(kv: KV) -> Self {
        Self::with_serializer(kv, BincodeLegacySerializer)
    }
}

impl<KV: KeyValueStore, LS: LegacyRecordSerializer> ValidatorDb<KV, LS> {
    pub fn with_serializer(kv: KV, legacy_serializer: LS) -> Self {
        Self {
            kv: RwLock::new(kv),
            legacy_serializer,
        }
    }

    /// Run `f` against a consistent read-only view.
    pub fn view<T>(&self, f: impl FnOnce(&ReadTx<'_, KV>) -> DbResult<T>) -> DbResult<T> {
        let guard = self.kv.read();
        let tx = ReadTx { kv: &*guard };
        f(&tx)
    }

    /// Run `f` in a read-write transaction, committing its writes atomically
    /// if and only if it returns `Ok`.
    pub fn update<T>(&self, f: impl FnOnce(&mut WriteTx<'_, KV>) -> DbResult<T>) -> DbResult<T> {
        let mut guard = self.kv.write();
        let (value, operations) = {
            let mut tx = WriteTx {
                kv: &*guard,
                pending: BTreeMap::new(),
            };
            let value = f(&mut tx)?;
            (value, tx.into_operations())
        };
        if !operations.is_empty() {
            guard.atomic_batch_write(operations).map_err(|e| {
                tracing::error!(error = %e, "[qc-18] Transaction commit failed");
                DbError::from(e)
            })?;
        }
        Ok(value)
    }

    pub(crate) fn legacy_serializer(&self) -> &LS {
        &self.legacy_serializer
    }
}

/// Read access shared by both transaction kinds.
pub trait Reader {
    /// Value stored under `key` in `bucket`.
    fn get(&self, bucket: Bucket, key: &[u8]) -> DbResult<Option<Vec<u8>>>;

    /// Every `(record key, value)` in `bucket`, ordered by record key.
    fn scan(&self, bucket: Bucket) -> DbResult<Vec<(Vec<u8>, Vec<u8>)>>;

    /// Record keys in `bucket` that are well-formed public keys.
    fn public_keys(&self, bucket: Bucket) -> DbResult<BTreeSet<PublicKey>> {
        Ok(self
            .scan(bucket)?
            .into_iter()
            .filter_map(|(key, _)| PublicKey::from_slice(&key))
            .collect())
    }
}

/// Read-only transaction.
pub struct ReadTx<'a, KV: KeyValueStore> {
    kv: &'a KV,
}

impl<KV: KeyValueStore> Reader for ReadTx<'_, KV> {
    fn get(&self, bucket: Bucket, key: &[u8]) -> DbResult<Option<Vec<u8>>> {
        Ok(self.kv.get(&bucket.key(key))?)
    }

    fn scan(&self, bucket: Bucket) -> DbResult<Vec<(Vec<u8>, Vec<u8>)>> {
        strip_all(bucket, self.kv.prefix_scan(&bucket.prefix())?)
    }
}

/// Read-write transaction. `None` in `pending` is a buffered delete.
pub struct WriteTx<'a, KV: KeyValueStore> {
    kv: &'a KV,
    pending: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<KV: KeyValueStore> WriteTx<'_, KV> {
    pub fn put(&mut self, bucket: Bucket, key: &[u8], value: impl Into<Vec<u8>>) {
        self.pending.insert(bucket.key(key), Some(value.into()));
    }

    pub fn delete(&mut self, bucket: Bucket, key: &[u8]) {
        self.pending.insert(bucket.key(key), None);
    }

    fn into_operations(self) -> Vec<BatchOperation> {
        self.pending
            .into_iter()
            .map(|(key, value)| match value {
                Some(value) => BatchOperation::put(key, value),
                None => BatchOperation::delete(key),
            })
            .collect()
    }
}

impl<KV: KeyValueStore> Reader for WriteTx<'_, KV> {
    fn get(&self, bucket: Bucket, key: &[u8]) -> DbResult<Option<Vec<u8>>> {
        let full = bucket.key(key);
        match self.pending.get(&full) {
            Some(buffered) => Ok(buffered.clone()),
            None => Ok(self.kv.get(&full)?),
        }
    }

    fn scan(&self, bucket: Bucket) -> DbResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let prefix = bucket.prefix();
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.kv.prefix_scan(&prefix)?.into_iter().collect();
        for (key, value) in self.pending.range(prefix.clone()..) {
            if !key.starts_with(&prefix) {
                break;
            }
            match value {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        strip_all(bucket, merged.into_iter().collect())
    }
}

fn strip_all(bucket: Bucket, pairs: Vec<(Vec<u8>, Vec<u8>)>) -> DbResult<Vec<(Vec<u8>, Vec<u8>)>> {
    Ok(pairs
        .into_iter()
        .filter_map(|(key, value)| bucket.strip(&key).map(|k| (k.to_vec(), value)))
        .collect())
}

/// Decode a big-endian u64 scalar record.
pub(crate) fn decode_u64(bucket: Bucket, bytes: &[u8]) -> DbResult<u64> {
    let array: [u8; 8] = bytes.try_into().map_err(|_| DbError::CorruptRecord {
        bucket: bucket.name(),
        expected: 8,
        found: bytes.len(),
    })?;
    Ok(u64::from_be_bytes(array))
}
