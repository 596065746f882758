//! # Outbound Ports (Driven Ports)
//!
//! Dependencies the validator database requires from its host.
//!
//! Production: `RocksDbStore` (adapters/storage/rocksdb.rs, `rocksdb` feature)
//! Testing: `InMemoryKVStore` (adapters/storage/memory.rs)

use crate::domain::errors::{DbError, KVStoreError};
use crate::domain::legacy::LegacyAttestationHistory;

/// Key/value pairs returned by a prefix scan, ordered by key.
pub type ScanResult = Vec<(Vec<u8>, Vec<u8>)>;

/// Abstract interface for key-value database operations.
///
/// Transactions are layered on top by `ValidatorDb`; a backend only has to
/// apply a batch atomically.
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError>;

    /// Execute an atomic batch write.
    ///
    /// Either ALL operations in the batch are applied, or NONE are.
    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError>;

    /// All pairs whose key starts with `prefix`, ordered by key.
    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError>;
}

/// Batch operation for atomic writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOperation {
    /// Put a key-value pair.
    Put { key: Vec<u8>, value: Vec<u8> },
    /// Delete a key.
    Delete { key: Vec<u8> },
}

impl BatchOperation {
    /// Create a Put operation.
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a Delete operation.
    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Delete { key: key.into() }
    }
}

/// Encoding of legacy history records.
pub trait LegacyRecordSerializer: Send + Sync {
    fn serialize(&self, record: &LegacyAttestationHistory) -> Result<Vec<u8>, DbError>;

    fn deserialize(&self, data: &[u8]) -> Result<LegacyAttestationHistory, DbError>;
}
